//! use_debounce

use core::cell::Cell;
use core::time::Duration;

use std::rc::Rc;

use reinhardt_reactive::{Cleanup, Effect, Signal};

use super::normalize_delay;
use crate::platform;

/// Delay used when none is given
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// A value that follows its source after a quiet period.
///
/// Owns the effect watching the source; dropping it freezes the value.
pub struct Debounced<T: 'static> {
	value: Signal<T>,
	_effect: Effect,
}

impl<T: Clone + 'static> Debounced<T> {
	/// Current settled value (tracked)
	pub fn get(&self) -> T {
		self.value.get()
	}

	/// Current settled value without tracking
	pub fn get_untracked(&self) -> T {
		self.value.get_untracked()
	}

	/// The output signal
	pub fn signal(&self) -> Signal<T> {
		self.value.clone()
	}
}

/// Debounces `source`: the output only takes a new value after `delay`
/// (default 500 ms) has passed without further changes.
///
/// Every change restarts the wait, so intermediate values are never
/// observable through the output.
///
/// # Example
///
/// ```ignore
/// let (query, set_query) = use_state(String::new());
/// let debounced = use_debounce(query, None);
///
/// let _search = use_effect(move || fetch_results(&debounced.get()));
/// ```
pub fn use_debounce<T>(source: Signal<T>, delay: impl Into<Option<Duration>>) -> Debounced<T>
where
	T: Clone + 'static,
{
	let delay = normalize_delay(delay.into().unwrap_or(DEFAULT_DEBOUNCE_DELAY));
	let platform = platform::current();
	let value = Signal::new(source.get_untracked());

	let effect = Effect::with_cleanup({
		let value = value.clone();
		move || {
			let next = source.get();
			let fired = Rc::new(Cell::new(false));
			let id = platform.set_timeout(
				delay,
				Box::new({
					let value = value.clone();
					let fired = Rc::clone(&fired);
					move || {
						fired.set(true);
						value.set(next);
					}
				}),
			);

			let platform = Rc::clone(&platform);
			Cleanup::new(move || {
				if !fired.get() {
					platform.clear_timeout(id);
				}
			})
		}
	});

	Debounced {
		value,
		_effect: effect,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_settles_after_quiet_period() {
		let mock = MockPlatform::install();
		let source = Signal::new("a".to_string());
		let debounced = use_debounce(source.clone(), Duration::from_millis(100));

		source.set("ab".to_string());
		mock.advance(Duration::from_millis(50));
		source.set("abc".to_string());
		mock.advance(Duration::from_millis(99));
		assert_eq!(debounced.get_untracked(), "a");

		mock.advance(Duration::from_millis(1));
		assert_eq!(debounced.get_untracked(), "abc");
	}

	#[test]
	#[serial]
	fn test_default_delay() {
		let mock = MockPlatform::install();
		let source = Signal::new(1);
		let debounced = use_debounce(source.clone(), None);

		source.set(2);
		mock.advance(DEFAULT_DEBOUNCE_DELAY - Duration::from_millis(1));
		assert_eq!(debounced.get_untracked(), 1);
		mock.advance(Duration::from_millis(1));
		assert_eq!(debounced.get_untracked(), 2);
	}

	#[test]
	#[serial]
	fn test_drop_cancels_pending_update() {
		let mock = MockPlatform::install();
		let source = Signal::new(1);
		let debounced = use_debounce(source.clone(), Duration::from_millis(10));
		let output = debounced.signal();

		source.set(2);
		mock.flush();
		drop(debounced);
		mock.advance(Duration::from_millis(20));
		assert_eq!(output.get_untracked(), 1);
		assert_eq!(mock.active_timers(), 0);
	}
}
