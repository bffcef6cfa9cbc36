//! Host platform abstraction.
//!
//! Every browser capability a hook touches goes through the [`Platform`] trait.
//! Three implementations exist:
//!
//! - [`BrowserPlatform`] (wasm32): `web-sys` bindings
//! - [`HeadlessPlatform`]: server-side / native default where every optional
//!   capability is absent and timers never fire
//! - [`MockPlatform`](crate::testing::MockPlatform): deterministic test double
//!
//! Hooks capture [`current()`] when they are created and keep using that
//! platform for their whole lifetime.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_hooks::platform;
//! use reinhardt_hooks::testing::MockPlatform;
//!
//! let mock = MockPlatform::install();
//! assert!(platform::current().is_client());
//! ```

#[cfg(target_arch = "wasm32")]
mod browser;
mod dom;
mod event;
mod headless;
mod observer;
mod storage;
mod wake_lock;

use core::cell::RefCell;
use core::time::Duration;

use std::rc::Rc;

use futures::future::LocalBoxFuture;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserPlatform;
pub use dom::{DomNode, Element, FOCUSABLE_SELECTOR, NodeRef};
pub use event::{Event, EventSource, EventTarget, Listener, ListenerOptions};
pub use headless::HeadlessPlatform;
pub use observer::{IntersectionCallback, IntersectionEntry, IntersectionObserver, ObserverInit};
pub use storage::{Storage, StorageKind};
pub use wake_lock::{WakeLockApi, WakeLockSentinel};

use crate::error::PlatformError;

/// Opaque timer handle returned by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(i64);

impl TimerId {
	/// Wrap a raw platform handle
	pub const fn new(raw: i64) -> Self {
		Self(raw)
	}

	/// The raw platform handle
	pub const fn raw(self) -> i64 {
		self.0
	}
}

/// Everything the hooks need from the host environment.
///
/// Methods for optional capabilities return `None` or
/// [`PlatformError::Unsupported`] when the capability is missing; hooks treat
/// that as a silent degrade.
pub trait Platform {
	/// Whether this is an interactive client (as opposed to server rendering)
	fn is_client(&self) -> bool;

	/// Run `callback` once after `delay`
	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

	/// Cancel a pending timeout; unknown ids are ignored
	fn clear_timeout(&self, id: TimerId);

	/// Run `callback` every `delay`
	fn set_interval(&self, delay: Duration, callback: Rc<dyn Fn()>) -> TimerId;

	/// Cancel an interval; unknown ids are ignored
	fn clear_interval(&self, id: TimerId);

	/// Drive a future to completion on the local task queue
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);

	/// Resolve an event source, `None` when it does not exist here
	fn event_target(&self, source: EventSource<'_>) -> Option<Rc<dyn EventTarget>>;

	/// Evaluate a media query, `None` when media queries are unsupported
	fn match_media(&self, query: &str) -> Option<bool>;

	/// Construct an intersection observer
	fn create_intersection_observer(
		&self,
		callback: IntersectionCallback,
		init: ObserverInit,
	) -> Result<Rc<dyn IntersectionObserver>, PlatformError>;

	/// The focused element
	fn active_element(&self) -> Option<Element>;

	/// The document's root element (`<html>`)
	fn document_element(&self) -> Option<Element>;

	/// All elements matching `selector`, in document order
	fn query_selector_all(&self, selector: &str) -> Vec<Element>;

	/// A storage area, `None` when unavailable or access is denied
	fn storage(&self, kind: StorageKind) -> Option<Rc<dyn Storage>>;

	/// Whether the document is hidden
	fn document_hidden(&self) -> bool;

	/// Whether the browser reports network connectivity
	fn is_online(&self) -> bool;

	/// The wake lock API, `None` when unsupported
	fn wake_lock(&self) -> Option<Rc<dyn WakeLockApi>>;

	/// Width of the document's vertical scrollbar in CSS pixels
	fn scrollbar_width(&self) -> f64 {
		0.0
	}
}

thread_local! {
	static CURRENT: RefCell<Option<Rc<dyn Platform>>> = const { RefCell::new(None) };
}

/// The platform hooks created on this thread will use.
///
/// Defaults to [`BrowserPlatform`] on wasm32 (when a window exists) and to
/// [`HeadlessPlatform`] otherwise.
pub fn current() -> Rc<dyn Platform> {
	CURRENT.with(|slot| {
		slot.borrow_mut()
			.get_or_insert_with(default_platform)
			.clone()
	})
}

/// Replace the platform for hooks created afterwards on this thread
pub fn set_platform(platform: Rc<dyn Platform>) {
	CURRENT.with(|slot| *slot.borrow_mut() = Some(platform));
}

/// Forget the installed platform; the next [`current()`] rebuilds the default
pub fn reset_platform() {
	let _ = CURRENT.try_with(|slot| slot.borrow_mut().take());
}

#[cfg(target_arch = "wasm32")]
fn default_platform() -> Rc<dyn Platform> {
	match BrowserPlatform::new() {
		Some(browser) => {
			browser.install_scheduler();
			Rc::new(browser)
		}
		None => {
			tracing::debug!("no window object, falling back to the headless platform");
			Rc::new(HeadlessPlatform::new())
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn default_platform() -> Rc<dyn Platform> {
	Rc::new(HeadlessPlatform::new())
}

#[cfg(test)]
mod tests {
	use super::*;
	use serial_test::serial;

	#[cfg(not(target_arch = "wasm32"))]
	#[test]
	#[serial]
	fn test_native_default_is_headless() {
		reset_platform();
		let platform = current();
		assert!(!platform.is_client());
		assert!(platform.match_media("(prefers-color-scheme: dark)").is_none());
	}

	#[cfg(not(target_arch = "wasm32"))]
	#[test]
	#[serial]
	fn test_set_platform_overrides_default() {
		let mock = crate::testing::MockPlatform::install();
		assert!(current().is_client());
		drop(mock);
		reset_platform();
		assert!(!current().is_client());
	}
}
