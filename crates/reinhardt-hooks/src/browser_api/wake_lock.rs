//! Screen wake lock: use_wake_lock
//!
//! The lock is requested at mount (unless disabled), released when the page
//! is hidden, and requested again when the page becomes visible if the user
//! still wants it. Re-acquisition is best effort: a visibility flip that
//! races a pending request may request more than once.

use core::cell::Cell;
use core::fmt;

use std::rc::{Rc, Weak};

use reinhardt_reactive::{Cleanup, Effect, Signal};

use super::event_listener::EventListener;
use super::visibility::use_visibility_listener;
use crate::error::PlatformError;
use crate::liveness::Liveness;
use crate::platform::{self, Listener, ListenerOptions, Platform, WakeLockApi, WakeLockSentinel};

/// Receives rejected wake lock requests
pub type WakeLockErrorHandler = Rc<dyn Fn(PlatformError)>;

/// Options of [`use_wake_lock`]
#[derive(Clone)]
pub struct WakeLockOptions {
	/// Request the lock at mount
	pub on_mount: bool,
	/// Called when a request is rejected; rejections are logged otherwise
	pub on_error: Option<WakeLockErrorHandler>,
}

impl Default for WakeLockOptions {
	fn default() -> Self {
		Self {
			on_mount: true,
			on_error: None,
		}
	}
}

impl WakeLockOptions {
	/// Set `on_mount`
	pub fn on_mount(mut self, on_mount: bool) -> Self {
		self.on_mount = on_mount;
		self
	}

	/// Set the rejection handler
	pub fn on_error<F>(mut self, on_error: F) -> Self
	where
		F: Fn(PlatformError) + 'static,
	{
		self.on_error = Some(Rc::new(on_error));
		self
	}
}

impl fmt::Debug for WakeLockOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WakeLockOptions")
			.field("on_mount", &self.on_mount)
			.field("on_error", &self.on_error.is_some())
			.finish()
	}
}

type Sentinel = Rc<dyn WakeLockSentinel>;

fn release_detached(platform: &dyn Platform, sentinel: &Sentinel) {
	if sentinel.released() {
		return;
	}
	let release = sentinel.release();
	platform.spawn_local(Box::pin(async move {
		if let Err(error) = release.await {
			tracing::error!(error = %error, "failed to release wake lock");
		}
	}));
}

struct WakeLockInner {
	platform: Rc<dyn Platform>,
	api: Option<Rc<dyn WakeLockApi>>,
	sentinel: Signal<Option<Sentinel>>,
	/// The user wants the lock back whenever the page is visible
	requested: Cell<bool>,
	pending: Cell<bool>,
	on_error: Option<WakeLockErrorHandler>,
	liveness: Liveness,
}

impl WakeLockInner {
	fn held(&self) -> bool {
		self.sentinel
			.with_untracked(|sentinel| sentinel.as_ref().is_some_and(|sentinel| !sentinel.released()))
	}

	fn acquire(self: &Rc<Self>, mark_requested: bool) {
		if self.held() || self.pending.get() {
			return;
		}
		let Some(api) = &self.api else {
			tracing::debug!("wake lock unavailable, request skipped");
			return;
		};

		self.pending.set(true);
		let request = api.request();
		let token = self.liveness.token();
		let inner: Weak<Self> = Rc::downgrade(self);
		let platform = Rc::clone(&self.platform);

		self.platform.spawn_local(Box::pin(async move {
			let result = request.await;
			let inner = inner.upgrade().filter(|_| token.is_alive());
			let Some(inner) = inner else {
				// Torn down while waiting
				if let Ok(sentinel) = result {
					release_detached(platform.as_ref(), &sentinel);
				}
				return;
			};

			inner.pending.set(false);
			match result {
				Ok(sentinel) => {
					tracing::debug!("wake lock acquired");
					inner.sentinel.set(Some(sentinel));
					if mark_requested {
						inner.requested.set(true);
					}
				}
				Err(error) => match &inner.on_error {
					Some(on_error) => on_error(error),
					None => tracing::error!(error = %error, "wake lock request failed"),
				},
			}
		}));
	}

	fn release(&self) {
		if let Some(sentinel) = self.sentinel.get_untracked() {
			release_detached(self.platform.as_ref(), &sentinel);
		}
	}
}

/// Handle returned by [`use_wake_lock`]
pub struct WakeLock {
	_visibility: EventListener,
	_release_watch: Effect,
	inner: Rc<WakeLockInner>,
}

impl WakeLock {
	/// Request the lock and keep it across visibility changes.
	///
	/// Does nothing while a lock is held.
	pub fn request_wake_lock(&self) {
		self.inner.acquire(true);
	}

	/// Release the lock and stop re-requesting it
	pub fn release_wake_lock(&self) {
		self.inner.requested.set(false);
		self.inner.release();
	}

	/// Whether a lock is held (tracked)
	pub fn enabled(&self) -> bool {
		self.inner
			.sentinel
			.with(|sentinel| sentinel.as_ref().is_some_and(|sentinel| !sentinel.released()))
	}

	/// The held sentinel, if any (tracked)
	pub fn sentinel(&self) -> Option<Rc<dyn WakeLockSentinel>> {
		self.inner.sentinel.get()
	}
}

impl Drop for WakeLock {
	fn drop(&mut self) {
		self.inner.liveness.invalidate();
	}
}

/// Keeps the screen awake.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::browser_api::{use_wake_lock, WakeLockOptions};
///
/// let wake_lock = use_wake_lock(
///     WakeLockOptions::default()
///         .on_mount(false)
///         .on_error(|error| tracing::warn!(%error, "screen may dim")),
/// );
/// wake_lock.request_wake_lock();
/// ```
pub fn use_wake_lock(options: WakeLockOptions) -> WakeLock {
	let platform = platform::current();
	let inner = Rc::new(WakeLockInner {
		api: platform.wake_lock(),
		platform,
		sentinel: Signal::new(None),
		requested: Cell::new(options.on_mount),
		pending: Cell::new(false),
		on_error: options.on_error,
		liveness: Liveness::new(),
	});

	// Clear the state when the sentinel reports released; release it on swap or drop
	let release_watch = Effect::with_cleanup({
		let sentinel_signal = inner.sentinel.clone();
		let platform = Rc::clone(&inner.platform);
		move || {
			let Some(sentinel) = sentinel_signal.get() else {
				return Cleanup::none();
			};

			let listener = Listener::new({
				let sentinel_signal = sentinel_signal.clone();
				let watched = Rc::downgrade(&sentinel);
				move |_| {
					if watched.upgrade().is_some_and(|sentinel| sentinel.released()) {
						sentinel_signal.set(None);
					}
				}
			});
			sentinel.add_event_listener("release", &listener, ListenerOptions::default());

			let platform = Rc::clone(&platform);
			Cleanup::new(move || {
				sentinel.remove_event_listener("release", &listener, ListenerOptions::default());
				release_detached(platform.as_ref(), &sentinel);
			})
		}
	});

	let visibility = use_visibility_listener({
		let inner = Rc::downgrade(&inner);
		move |visible| {
			let Some(inner) = inner.upgrade() else {
				return;
			};
			if !visible {
				inner.release();
			} else if !inner.held() && inner.requested.get() {
				inner.acquire(false);
			}
		}
	});

	if options.on_mount {
		inner.acquire(false);
	}

	WakeLock {
		_visibility: visibility,
		_release_watch: release_watch,
		inner,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use core::cell::RefCell;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_requests_on_mount() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();

		assert!(wake_lock.enabled());
		assert_eq!(mock.wake_lock_api().requests(), 1);
	}

	#[test]
	#[serial]
	fn test_request_is_noop_while_held() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();

		wake_lock.request_wake_lock();
		mock.flush();
		assert_eq!(mock.wake_lock_api().requests(), 1);
	}

	#[test]
	#[serial]
	fn test_hidden_releases_and_visible_reacquires() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();

		mock.set_document_hidden(true);
		assert!(!wake_lock.enabled());
		assert_eq!(mock.wake_lock_api().held(), 0);

		mock.set_document_hidden(false);
		assert!(wake_lock.enabled());
		assert!(mock.wake_lock_api().requests() >= 2);
	}

	#[test]
	#[serial]
	fn test_release_stops_reacquiring() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();

		wake_lock.release_wake_lock();
		mock.flush();
		assert!(!wake_lock.enabled());

		mock.set_document_hidden(true);
		mock.set_document_hidden(false);
		assert!(!wake_lock.enabled());
		assert_eq!(mock.wake_lock_api().requests(), 1);
	}

	#[test]
	#[serial]
	fn test_system_release_clears_state() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();

		mock.wake_lock_api().sentinels()[0].system_release();
		mock.flush();
		assert!(!wake_lock.enabled());
		assert!(wake_lock.sentinel().is_none());
	}

	#[test]
	#[serial]
	fn test_rejection_goes_to_on_error() {
		let mock = MockPlatform::install();
		mock.wake_lock_api().reject_with(Some(PlatformError::Rejected {
			name: "NotAllowedError".into(),
			message: "denied".into(),
		}));
		let errors = Rc::new(RefCell::new(Vec::new()));

		let wake_lock = use_wake_lock(WakeLockOptions::default().on_error({
			let errors = Rc::clone(&errors);
			move |error| errors.borrow_mut().push(error)
		}));
		mock.flush();

		assert!(!wake_lock.enabled());
		assert_eq!(errors.borrow().len(), 1);
	}

	#[test]
	#[serial]
	fn test_drop_releases_held_lock() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());
		mock.flush();
		assert_eq!(mock.wake_lock_api().held(), 1);

		drop(wake_lock);
		mock.flush();
		assert_eq!(mock.wake_lock_api().held(), 0);
		assert_eq!(mock.wake_lock_api().sentinels()[0].listener_count(), 0);
	}

	#[test]
	#[serial]
	fn test_grant_after_drop_is_released() {
		let mock = MockPlatform::install();
		let wake_lock = use_wake_lock(WakeLockOptions::default());

		drop(wake_lock);
		mock.flush();
		assert_eq!(mock.wake_lock_api().requests(), 1);
		assert_eq!(mock.wake_lock_api().held(), 0);
	}

	#[test]
	#[serial]
	fn test_unsupported_is_inert() {
		let mock = MockPlatform::install();
		mock.set_wake_lock_supported(false);

		let wake_lock = use_wake_lock(WakeLockOptions::default());
		wake_lock.request_wake_lock();
		mock.flush();
		assert!(!wake_lock.enabled());
	}
}
