//! Fire-and-forget timers without start/stop controls

use core::cell::Cell;
use core::time::Duration;

use std::rc::Rc;

use super::normalize_delay;
use super::timer::TimerKind;
use crate::platform::{self, Platform, TimerId};

/// Guard for a light timer; dropping it cancels the timer
pub struct LightTimer {
	platform: Rc<dyn Platform>,
	kind: TimerKind,
	id: TimerId,
	fired: Rc<Cell<bool>>,
}

impl Drop for LightTimer {
	fn drop(&mut self) {
		match self.kind {
			TimerKind::Timeout if !self.fired.get() => self.platform.clear_timeout(self.id),
			TimerKind::Timeout => {}
			TimerKind::Interval => self.platform.clear_interval(self.id),
		}
	}
}

/// Runs `callback` once after `delay`, unless the guard is dropped first
pub fn use_light_timeout<F>(callback: F, delay: Duration) -> LightTimer
where
	F: FnOnce() + 'static,
{
	let platform = platform::current();
	let fired = Rc::new(Cell::new(false));
	let id = platform.set_timeout(
		normalize_delay(delay),
		Box::new({
			let fired = Rc::clone(&fired);
			move || {
				fired.set(true);
				callback();
			}
		}),
	);
	LightTimer {
		platform,
		kind: TimerKind::Timeout,
		id,
		fired,
	}
}

/// Runs `callback` every `delay` until the guard is dropped
pub fn use_light_interval<F>(callback: F, delay: Duration) -> LightTimer
where
	F: Fn() + 'static,
{
	let platform = platform::current();
	let id = platform.set_interval(normalize_delay(delay), Rc::new(callback));
	LightTimer {
		platform,
		kind: TimerKind::Interval,
		id,
		fired: Rc::new(Cell::new(false)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_light_timeout_does_not_clear_after_firing() {
		let mock = MockPlatform::install();
		let hits = Rc::new(Cell::new(0));
		let guard = use_light_timeout(
			{
				let hits = Rc::clone(&hits);
				move || hits.set(hits.get() + 1)
			},
			Duration::from_millis(5),
		);

		mock.advance(Duration::from_millis(5));
		assert_eq!(hits.get(), 1);

		drop(guard);
		assert_eq!(mock.timer_calls().clear_timeout, 0);
	}

	#[test]
	#[serial]
	fn test_light_interval_stops_on_drop() {
		let mock = MockPlatform::install();
		let hits = Rc::new(Cell::new(0));
		let guard = use_light_interval(
			{
				let hits = Rc::clone(&hits);
				move || hits.set(hits.get() + 1)
			},
			Duration::from_millis(10),
		);

		mock.advance(Duration::from_millis(30));
		drop(guard);
		mock.advance(Duration::from_millis(30));
		assert_eq!(hits.get(), 3);
	}
}
