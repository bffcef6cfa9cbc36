//! Start/stop timers: use_timeout, use_interval and their stateful variants

use core::cell::Cell;

use std::rc::Rc;

use reinhardt_reactive::Signal;

use super::{TimerOptions, normalize_delay};
use crate::platform::{self, Platform, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
	Timeout,
	Interval,
}

/// State shared by every start/stop timer handle
pub(crate) struct TimerCore {
	platform: Rc<dyn Platform>,
	kind: TimerKind,
	callback: Rc<dyn Fn()>,
	options: TimerOptions,
	handle: Cell<Option<TimerId>>,
	active: Option<Signal<bool>>,
}

impl TimerCore {
	pub(crate) fn new(
		kind: TimerKind,
		callback: Rc<dyn Fn()>,
		options: TimerOptions,
		active: Option<Signal<bool>>,
	) -> Rc<Self> {
		Rc::new(Self {
			platform: platform::current(),
			kind,
			callback,
			options: TimerOptions {
				delay: normalize_delay(options.delay),
				..options
			},
			handle: Cell::new(None),
			active,
		})
	}

	pub(crate) fn platform(&self) -> &Rc<dyn Platform> {
		&self.platform
	}

	/// Cancel the live timer without touching state; `true` if one was running
	fn clear(&self) -> bool {
		let Some(id) = self.handle.take() else {
			return false;
		};
		match self.kind {
			TimerKind::Timeout => self.platform.clear_timeout(id),
			TimerKind::Interval => self.platform.clear_interval(id),
		}
		true
	}

	pub(crate) fn start(self: &Rc<Self>) -> TimerId {
		let was_running = self.clear();

		if self.options.run_on_start {
			(self.callback)();
		}

		let id = match self.kind {
			TimerKind::Timeout => {
				let core = Rc::downgrade(self);
				self.platform.set_timeout(
					self.options.delay,
					Box::new(move || {
						let Some(core) = core.upgrade() else {
							return;
						};
						core.handle.set(None);
						if let Some(active) = &core.active {
							active.set_if_changed(false);
						}
						(core.callback)();
					}),
				)
			}
			TimerKind::Interval => self
				.platform
				.set_interval(self.options.delay, Rc::clone(&self.callback)),
		};
		self.handle.set(Some(id));
		tracing::trace!(kind = ?self.kind, delay = ?self.options.delay, "timer armed");

		if !was_running {
			if let Some(active) = &self.active {
				active.set_if_changed(true);
			}
		}
		id
	}

	pub(crate) fn stop(&self) {
		if !self.clear() {
			return;
		}
		if let Some(active) = &self.active {
			active.set_if_changed(false);
		}
	}

	pub(crate) fn is_running(&self) -> bool {
		self.handle.get().is_some()
	}
}

impl Drop for TimerCore {
	fn drop(&mut self) {
		self.clear();
	}
}

/// Handle returned by [`use_timeout`] and [`use_interval`]
pub struct Timer {
	core: Rc<TimerCore>,
}

impl Timer {
	/// (Re)arm the timer, cancelling the previous one first
	pub fn start(&self) -> TimerId {
		self.core.start()
	}

	/// Cancel the timer; does nothing when it is not running
	pub fn stop(&self) {
		self.core.stop();
	}

	/// Whether a platform timer is currently armed
	pub fn is_running(&self) -> bool {
		self.core.is_running()
	}
}

/// Handle returned by the stateful timer hooks
pub struct StatefulTimer {
	core: Rc<TimerCore>,
	active: Signal<bool>,
}

impl StatefulTimer {
	/// (Re)arm the timer, cancelling the previous one first
	pub fn start(&self) -> TimerId {
		self.core.start()
	}

	/// Cancel the timer; does nothing when it is not running
	pub fn stop(&self) {
		self.core.stop();
	}

	/// Reactive running state; reading it inside an effect tracks it
	pub fn is_active(&self) -> bool {
		self.active.get()
	}

	/// The underlying signal
	pub fn is_active_signal(&self) -> Signal<bool> {
		self.active.clone()
	}
}

fn create<F>(kind: TimerKind, callback: F, options: TimerOptions, active: Option<Signal<bool>>) -> Rc<TimerCore>
where
	F: Fn() + 'static,
{
	let core = TimerCore::new(kind, Rc::new(callback), options, active);
	if options.autoplay {
		core.start();
	}
	core
}

/// Schedules a one-time `callback` after `delay`.
///
/// Delays outside `1..=2_147_483_647` ms are clamped to 1 ms. The timer starts
/// immediately unless `autoplay` is off, and is cancelled when the returned
/// handle is dropped.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use reinhardt_hooks::timers::{use_timeout, TimerOptions};
///
/// let timer = use_timeout(
///     || tracing::info!("saved"),
///     TimerOptions::default().delay(Duration::from_secs(2)).autoplay(false),
/// );
/// timer.start();
/// ```
pub fn use_timeout<F>(callback: F, options: impl Into<TimerOptions>) -> Timer
where
	F: Fn() + 'static,
{
	Timer {
		core: create(TimerKind::Timeout, callback, options.into(), None),
	}
}

/// [`use_timeout`] with a reactive `is_active` flag.
///
/// The flag starts at `autoplay`, turns `false` when the timeout fires (before
/// the callback runs) or is stopped, and `true` when a stopped timer starts.
pub fn use_stateful_timeout<F>(callback: F, options: impl Into<TimerOptions>) -> StatefulTimer
where
	F: Fn() + 'static,
{
	let options = options.into();
	let active = Signal::new(options.autoplay);
	let core = create(TimerKind::Timeout, callback, options, Some(active.clone()));
	StatefulTimer { core, active }
}

/// Schedules repeated execution of `callback` every `delay`.
pub fn use_interval<F>(callback: F, options: impl Into<TimerOptions>) -> Timer
where
	F: Fn() + 'static,
{
	Timer {
		core: create(TimerKind::Interval, callback, options.into(), None),
	}
}

/// [`use_interval`] with a reactive `is_active` flag
pub fn use_stateful_interval<F>(callback: F, options: impl Into<TimerOptions>) -> StatefulTimer
where
	F: Fn() + 'static,
{
	let options = options.into();
	let active = Signal::new(options.autoplay);
	let core = create(TimerKind::Interval, callback, options, Some(active.clone()));
	StatefulTimer { core, active }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use core::time::Duration;
	use serial_test::serial;

	fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
		let count = Rc::new(Cell::new(0));
		let callback = {
			let count = Rc::clone(&count);
			move || count.set(count.get() + 1)
		};
		(count, callback)
	}

	#[test]
	#[serial]
	fn test_timeout_fires_once_after_delay() {
		let mock = MockPlatform::install();
		let (count, callback) = counter();
		let _timer = use_timeout(callback, Duration::from_millis(100));

		mock.advance(Duration::from_millis(99));
		assert_eq!(count.get(), 0);
		mock.advance(Duration::from_millis(1));
		assert_eq!(count.get(), 1);
		mock.advance(Duration::from_millis(500));
		assert_eq!(count.get(), 1);
	}

	#[test]
	#[serial]
	fn test_start_rearms_and_clears_previous() {
		let mock = MockPlatform::install();
		let (count, callback) = counter();
		let timer = use_timeout(callback, Duration::from_millis(100));

		mock.advance(Duration::from_millis(60));
		timer.start();
		mock.advance(Duration::from_millis(60));
		assert_eq!(count.get(), 0);
		assert_eq!(mock.active_timers(), 1);

		mock.advance(Duration::from_millis(40));
		assert_eq!(count.get(), 1);
	}

	#[test]
	#[serial]
	fn test_stop_is_idempotent() {
		let mock = MockPlatform::install();
		let (_count, callback) = counter();
		let timer = use_stateful_timeout(callback, Duration::from_millis(100));
		assert!(timer.is_active());

		timer.stop();
		let after_first_stop = mock.timer_calls();
		assert!(!timer.is_active());

		timer.stop();
		assert_eq!(mock.timer_calls(), after_first_stop);
		assert!(!timer.is_active());
	}

	#[test]
	#[serial]
	fn test_stateful_timeout_goes_inactive_before_callback() {
		let mock = MockPlatform::install();
		let seen = Rc::new(Cell::new(None));
		let active = Rc::new(core::cell::RefCell::new(None::<Signal<bool>>));
		let timer = use_stateful_timeout(
			{
				let seen = Rc::clone(&seen);
				let active = Rc::clone(&active);
				move || seen.set(active.borrow().as_ref().map(Signal::get_untracked))
			},
			Duration::from_millis(10),
		);
		*active.borrow_mut() = Some(timer.is_active_signal());

		mock.advance(Duration::from_millis(10));
		assert_eq!(seen.get(), Some(false));
		assert!(!timer.is_active());
	}

	#[test]
	#[serial]
	fn test_no_autoplay_waits_for_start() {
		let mock = MockPlatform::install();
		let (count, callback) = counter();
		let timer = use_stateful_interval(
			callback,
			TimerOptions::default()
				.delay(Duration::from_millis(10))
				.autoplay(false),
		);
		assert!(!timer.is_active());

		mock.advance(Duration::from_millis(50));
		assert_eq!(count.get(), 0);

		timer.start();
		assert!(timer.is_active());
		mock.advance(Duration::from_millis(35));
		assert_eq!(count.get(), 3);
	}

	#[test]
	#[serial]
	fn test_run_on_start_invokes_immediately() {
		let mock = MockPlatform::install();
		let (count, callback) = counter();
		let _timer = use_interval(
			callback,
			TimerOptions::default()
				.delay(Duration::from_millis(10))
				.run_on_start(true),
		);
		assert_eq!(count.get(), 1);

		mock.advance(Duration::from_millis(10));
		assert_eq!(count.get(), 2);
	}

	#[test]
	#[serial]
	fn test_drop_cancels_timer() {
		let mock = MockPlatform::install();
		let (count, callback) = counter();
		let timer = use_interval(callback, Duration::from_millis(10));

		drop(timer);
		assert_eq!(mock.active_timers(), 0);
		mock.advance(Duration::from_millis(100));
		assert_eq!(count.get(), 0);
	}
}
