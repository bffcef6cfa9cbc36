//! Generation tokens for asynchronous continuations.
//!
//! A [`Liveness`] is owned by a hook instance and bumped at every teardown.
//! Work that suspends (awaiting a consumer callback, a wake-lock request)
//! captures a [`LivenessToken`] first and checks it before writing state.

use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Generation counter owned by one hook instance
#[derive(Debug, Clone, Default)]
pub struct Liveness(Rc<Cell<u64>>);

impl Liveness {
	/// Create a counter at generation zero
	pub fn new() -> Self {
		Self::default()
	}

	/// Capture the current generation
	pub fn token(&self) -> LivenessToken {
		LivenessToken {
			generation: self.0.get(),
			source: Rc::downgrade(&self.0),
		}
	}

	/// Start a new generation, killing every outstanding token
	pub fn invalidate(&self) {
		self.0.set(self.0.get().wrapping_add(1));
	}
}

/// A captured generation
#[derive(Debug, Clone)]
pub struct LivenessToken {
	generation: u64,
	source: Weak<Cell<u64>>,
}

impl LivenessToken {
	/// Whether the owner is alive and has not been torn down since capture
	pub fn is_alive(&self) -> bool {
		self.source
			.upgrade()
			.is_some_and(|current| current.get() == self.generation)
	}
}
