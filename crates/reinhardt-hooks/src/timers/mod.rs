//! Timer hooks.
//!
//! - [`use_timeout`] / [`use_interval`]: start/stop handles
//! - [`use_stateful_timeout`] / [`use_stateful_interval`]: the same, plus a
//!   reactive `is_active` flag
//! - [`use_light_timeout`] / [`use_light_interval`]: fire-and-forget guards
//! - [`use_interval_when_visible`]: an interval paused while the page is hidden
//! - [`use_debounce`]: a value that settles after a quiet period
//!
//! Every handle cancels its platform timer when dropped.

mod debounce;
mod light;
mod timer;
mod visible;

use core::time::Duration;

use serde::{Deserialize, Serialize};

pub use debounce::{DEFAULT_DEBOUNCE_DELAY, Debounced, use_debounce};
pub use light::{LightTimer, use_light_interval, use_light_timeout};
pub use timer::{
	StatefulTimer, Timer, use_interval, use_stateful_interval, use_stateful_timeout, use_timeout,
};
pub use visible::{VisibleInterval, use_interval_when_visible, use_stateful_interval_when_visible};

/// Largest delay a browser timer accepts, in milliseconds
pub const MAX_TIMER_DELAY_MS: u64 = 2_147_483_647;

/// Options shared by the start/stop timer hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerOptions {
	/// Time to wait before the callback runs (or between runs)
	pub delay: Duration,
	/// Start when the hook is created
	pub autoplay: bool,
	/// Invoke the callback synchronously on every `start()`
	pub run_on_start: bool,
}

impl Default for TimerOptions {
	fn default() -> Self {
		Self {
			delay: Duration::from_millis(1),
			autoplay: true,
			run_on_start: false,
		}
	}
}

impl TimerOptions {
	/// Set `delay`
	pub fn delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	/// Set `autoplay`
	pub fn autoplay(mut self, autoplay: bool) -> Self {
		self.autoplay = autoplay;
		self
	}

	/// Set `run_on_start`
	pub fn run_on_start(mut self, run_on_start: bool) -> Self {
		self.run_on_start = run_on_start;
		self
	}
}

impl From<Duration> for TimerOptions {
	fn from(delay: Duration) -> Self {
		Self::default().delay(delay)
	}
}

/// Clamp a delay the way browsers do.
///
/// Anything below 1 ms or above [`MAX_TIMER_DELAY_MS`] becomes 1 ms, and
/// sub-millisecond precision is dropped.
pub fn normalize_delay(delay: Duration) -> Duration {
	let millis = delay.as_millis();
	if millis < 1 || millis > u128::from(MAX_TIMER_DELAY_MS) {
		Duration::from_millis(1)
	} else {
		Duration::from_millis(millis as u64)
	}
}
