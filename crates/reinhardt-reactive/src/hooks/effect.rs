//! Effect hooks: use_effect, use_effect_with_cleanup and use_layout_effect

use crate::effect::{Cleanup, Effect};
use crate::runtime::EffectTiming;

/// Runs a side effect with automatic dependency tracking.
///
/// Equivalent of React's `useEffect` without a dependency array: any Signal
/// read inside `f` is a dependency. The returned Effect must be kept alive.
pub fn use_effect<F>(f: F) -> Effect
where
	F: FnMut() + 'static,
{
	Effect::new(f)
}

/// Runs a side effect that returns a [`Cleanup`].
///
/// The cleanup runs before the effect re-runs and when the Effect is dropped.
///
/// ```ignore
/// let _effect = use_effect_with_cleanup(move || {
///     let id = platform.set_interval(delay, tick.clone());
///     let platform = platform.clone();
///     Cleanup::new(move || platform.clear_interval(id))
/// });
/// ```
pub fn use_effect_with_cleanup<F>(f: F) -> Effect
where
	F: FnMut() -> Cleanup + 'static,
{
	Effect::with_cleanup(f)
}

/// Runs a side effect synchronously whenever a dependency changes.
pub fn use_layout_effect<F>(f: F) -> Effect
where
	F: FnMut() + 'static,
{
	Effect::new_with_timing(f, EffectTiming::Layout)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::runtime::flush_effects;
	use crate::signal::Signal;
	use serial_test::serial;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[test]
	#[serial]
	fn test_use_effect_tracks_dependencies() {
		let count = Signal::new(0);
		let effect_count = Rc::new(RefCell::new(0));

		let _effect = use_effect({
			let count = count.clone();
			let effect_count = Rc::clone(&effect_count);
			move || {
				let _ = count.get();
				*effect_count.borrow_mut() += 1;
			}
		});

		count.set(1);
		flush_effects();
		assert_eq!(*effect_count.borrow(), 2);
	}

	#[test]
	#[serial]
	fn test_use_layout_effect_needs_no_flush() {
		let count = Signal::new(0);
		let mirrored = Rc::new(RefCell::new(0));

		let _effect = use_layout_effect({
			let count = count.clone();
			let mirrored = Rc::clone(&mirrored);
			move || *mirrored.borrow_mut() = count.get()
		});

		count.set(3);
		assert_eq!(*mirrored.borrow(), 3);
	}

	#[test]
	#[serial]
	fn test_use_effect_with_cleanup_releases_on_drop() {
		let released = Rc::new(RefCell::new(false));

		let effect = use_effect_with_cleanup({
			let released = Rc::clone(&released);
			move || {
				let released = Rc::clone(&released);
				Cleanup::new(move || *released.borrow_mut() = true)
			}
		});

		assert!(!*released.borrow());
		drop(effect);
		assert!(*released.borrow());
	}
}
