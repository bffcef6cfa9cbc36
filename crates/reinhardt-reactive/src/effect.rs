//! Effect - Reactive Side Effects
//!
//! `Effect` represents a side effect that re-runs when its dependencies change.
//! Any Signal read inside the effect closure becomes a dependency.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: reads are recorded on every run
//! - **Cleanup Support**: [`Effect::with_cleanup`] returns a [`Cleanup`] that runs
//!   before the next run and when the effect is dropped
//! - **Memory Safe**: dropping the Effect removes it from the dependency graph
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::{Cleanup, Effect, Signal};
//!
//! let visible = Signal::new(true);
//!
//! let _effect = Effect::with_cleanup({
//!     let visible = visible.clone();
//!     move || {
//!         if !visible.get() {
//!             return Cleanup::none();
//!         }
//!         let handle = start_polling();
//!         Cleanup::new(move || handle.stop())
//!     }
//! });
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;

use std::collections::BTreeMap;

use crate::runtime::{EffectTiming, NodeId, NodeType, Observer, try_with_runtime, with_runtime};

/// Teardown returned from an effect run.
///
/// Runs exactly once: before the owning effect runs again, or when it is disposed.
#[derive(Default)]
#[must_use = "a dropped Cleanup never runs"]
pub struct Cleanup(Option<Box<dyn FnOnce()>>);

impl Cleanup {
	/// A cleanup that does nothing
	pub fn none() -> Self {
		Self(None)
	}

	/// Wrap a teardown closure
	pub fn new<F>(f: F) -> Self
	where
		F: FnOnce() + 'static,
	{
		Self(Some(Box::new(f)))
	}

	/// Whether this cleanup carries a teardown closure
	pub fn is_none(&self) -> bool {
		self.0.is_none()
	}

	/// Run the teardown now
	pub fn run(self) {
		if let Some(f) = self.0 {
			f();
		}
	}
}

impl fmt::Debug for Cleanup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Cleanup")
			.field(&self.0.as_ref().map(|_| ".."))
			.finish()
	}
}

impl From<()> for Cleanup {
	fn from(_: ()) -> Self {
		Self::none()
	}
}

type EffectFn = Box<dyn FnMut() -> Cleanup + 'static>;

/// Storage slot for one effect.
///
/// `run` is `None` while the effect is executing, which also guards against
/// re-entrant execution.
struct EffectSlot {
	run: Option<EffectFn>,
	cleanup: Cleanup,
	timing: EffectTiming,
}

thread_local! {
	static EFFECTS: RefCell<BTreeMap<NodeId, EffectSlot>> = const { RefCell::new(BTreeMap::new()) };
}

/// Get the timing for an effect by its ID.
///
/// Returns `None` if the node is not a live Effect.
pub(crate) fn get_effect_timing(effect_id: NodeId) -> Option<EffectTiming> {
	EFFECTS
		.try_with(|storage| storage.borrow().get(&effect_id).map(|slot| slot.timing))
		.ok()
		.flatten()
}

/// A reactive effect that re-runs when its dependencies change
///
/// Effects run once immediately on creation. Passive effects (the default) are
/// re-run by the next flush; layout effects re-run synchronously on `set()`.
pub struct Effect {
	/// Unique identifier for this effect
	id: NodeId,
	/// Whether this effect has been disposed
	disposed: Cell<bool>,
}

impl Effect {
	/// Create a passive Effect that runs the given function
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		Self::create(
			Box::new(move || {
				f();
				Cleanup::none()
			}),
			EffectTiming::Passive,
		)
	}

	/// Create an Effect with the given execution timing
	pub fn new_with_timing<F>(mut f: F, timing: EffectTiming) -> Self
	where
		F: FnMut() + 'static,
	{
		Self::create(
			Box::new(move || {
				f();
				Cleanup::none()
			}),
			timing,
		)
	}

	/// Create a passive Effect whose runs return a [`Cleanup`]
	pub fn with_cleanup<F>(f: F) -> Self
	where
		F: FnMut() -> Cleanup + 'static,
	{
		Self::create(Box::new(f), EffectTiming::Passive)
	}

	/// Create an Effect with cleanup support and explicit timing
	pub fn with_cleanup_and_timing<F>(f: F, timing: EffectTiming) -> Self
	where
		F: FnMut() -> Cleanup + 'static,
	{
		Self::create(Box::new(f), timing)
	}

	fn create(run: EffectFn, timing: EffectTiming) -> Self {
		let id = NodeId::new();

		EFFECTS.with(|storage| {
			storage.borrow_mut().insert(
				id,
				EffectSlot {
					run: Some(run),
					cleanup: Cleanup::none(),
					timing,
				},
			);
		});

		Self::execute_effect(id);

		Self {
			id,
			disposed: Cell::new(false),
		}
	}

	/// Execute an effect by its ID
	///
	/// The closure is taken out of storage for the duration of the run so the
	/// effect body may create, drop, or trigger other effects.
	pub(crate) fn execute_effect(effect_id: NodeId) {
		let taken = EFFECTS
			.try_with(|storage| {
				let mut storage = storage.borrow_mut();
				let slot = storage.get_mut(&effect_id)?;
				let run = slot.run.take()?;
				Some((run, core::mem::take(&mut slot.cleanup), slot.timing))
			})
			.ok()
			.flatten();

		let Some((mut run, previous_cleanup, timing)) = taken else {
			return;
		};

		with_runtime(|rt| rt.untracked(|| previous_cleanup.run()));

		with_runtime(|rt| {
			rt.clear_dependencies(effect_id);
			rt.push_observer(Observer {
				id: effect_id,
				node_type: NodeType::Effect,
				timing,
			});
		});

		let cleanup = run();

		with_runtime(|rt| {
			rt.pop_observer();
		});

		// The effect may have been disposed while it was running
		let orphaned = EFFECTS
			.try_with(|storage| {
				let mut storage = storage.borrow_mut();
				match storage.get_mut(&effect_id) {
					Some(slot) => {
						slot.run = Some(run);
						slot.cleanup = cleanup;
						None
					}
					None => Some(cleanup),
				}
			})
			.ok()
			.flatten();

		if let Some(cleanup) = orphaned {
			cleanup.run();
		}
	}

	/// Get the NodeId of this effect
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Whether [`Effect::dispose`] has been called
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Dispose this effect
	///
	/// Runs the pending cleanup, stops future runs, and removes the node from
	/// the dependency graph. Calling it again is a no-op.
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}

		let _ = try_with_runtime(|rt| rt.remove_node(self.id));

		let slot = EFFECTS
			.try_with(|storage| storage.borrow_mut().remove(&self.id))
			.ok()
			.flatten();

		// Dropping the closure can drop nested effects, so do it outside the borrow
		if let Some(slot) = slot {
			let EffectSlot { run, cleanup, .. } = slot;
			cleanup.run();
			drop(run);
		}
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id)
			.field("disposed", &self.disposed.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::rc::Rc;
	use crate::runtime::flush_effects;
	use crate::signal::Signal;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_effect_runs_immediately() {
		let run_count = Rc::new(Cell::new(0));
		let run_count_clone = run_count.clone();

		let _effect = Effect::new(move || {
			run_count_clone.set(run_count_clone.get() + 1);
		});

		assert_eq!(run_count.get(), 1);
	}

	#[test]
	#[serial]
	fn test_effect_reruns_on_signal_change() {
		let signal = Signal::new(0);
		let values = Rc::new(RefCell::new(Vec::new()));
		let values_clone = values.clone();

		let signal_clone = signal.clone();
		let _effect = Effect::new(move || {
			values_clone.borrow_mut().push(signal_clone.get());
		});

		assert_eq!(*values.borrow(), vec![0]);

		signal.set(10);
		flush_effects();
		assert_eq!(*values.borrow(), vec![0, 10]);

		signal.set(20);
		flush_effects();
		assert_eq!(*values.borrow(), vec![0, 10, 20]);
	}

	#[test]
	#[serial]
	fn test_passive_effect_batches_until_flush() {
		let signal = Signal::new(0);
		let run_count = Rc::new(Cell::new(0));

		let _effect = Effect::new({
			let signal = signal.clone();
			let run_count = run_count.clone();
			move || {
				let _ = signal.get();
				run_count.set(run_count.get() + 1);
			}
		});

		signal.set(1);
		signal.set(2);
		signal.set(3);
		assert_eq!(run_count.get(), 1);

		flush_effects();
		assert_eq!(run_count.get(), 2);
	}

	#[test]
	#[serial]
	fn test_layout_effect_runs_synchronously() {
		let signal = Signal::new(0);
		let seen = Rc::new(Cell::new(0));

		let _effect = Effect::new_with_timing(
			{
				let signal = signal.clone();
				let seen = seen.clone();
				move || seen.set(signal.get())
			},
			EffectTiming::Layout,
		);

		signal.set(7);
		assert_eq!(seen.get(), 7);
	}

	#[test]
	#[serial]
	fn test_cleanup_runs_before_rerun_and_on_drop() {
		let signal = Signal::new(0);
		let log = Rc::new(RefCell::new(Vec::new()));

		let effect = Effect::with_cleanup({
			let signal = signal.clone();
			let log = log.clone();
			move || {
				let value = signal.get();
				log.borrow_mut().push(format!("run {value}"));
				let log = log.clone();
				Cleanup::new(move || log.borrow_mut().push(format!("cleanup {value}")))
			}
		});

		signal.set(1);
		flush_effects();
		drop(effect);

		assert_eq!(
			*log.borrow(),
			vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
		);
	}

	#[test]
	#[serial]
	fn test_effect_dispose_stops_reruns() {
		let signal = Signal::new(0);
		let run_count = Rc::new(Cell::new(0));

		let effect = Effect::new({
			let signal = signal.clone();
			let run_count = run_count.clone();
			move || {
				let _ = signal.get();
				run_count.set(run_count.get() + 1);
			}
		});

		effect.dispose();
		assert!(effect.is_disposed());

		signal.set(10);
		flush_effects();
		assert_eq!(run_count.get(), 1);
	}

	#[test]
	#[serial]
	fn test_nested_effect_is_owned_by_outer_run() {
		let outer_signal = Signal::new(0);
		let inner_signal = Signal::new(0);
		let inner_runs = Rc::new(Cell::new(0));

		let _outer = Effect::with_cleanup({
			let outer_signal = outer_signal.clone();
			let inner_signal = inner_signal.clone();
			let inner_runs = inner_runs.clone();
			move || {
				let _ = outer_signal.get();
				let inner = Effect::new({
					let inner_signal = inner_signal.clone();
					let inner_runs = inner_runs.clone();
					move || {
						let _ = inner_signal.get();
						inner_runs.set(inner_runs.get() + 1);
					}
				});
				Cleanup::new(move || drop(inner))
			}
		});
		assert_eq!(inner_runs.get(), 1);

		inner_signal.set(1);
		flush_effects();
		assert_eq!(inner_runs.get(), 2);

		// Re-running the outer effect replaces the inner one
		outer_signal.set(1);
		flush_effects();
		assert_eq!(inner_runs.get(), 3);

		inner_signal.set(2);
		flush_effects();
		assert_eq!(inner_runs.get(), 4);
	}

	#[test]
	#[serial]
	fn test_effect_writing_its_own_dependency_does_not_recurse() {
		let signal = Signal::new(0);

		let _effect = Effect::new_with_timing(
			{
				let signal = signal.clone();
				move || {
					let value = signal.get();
					if value < 5 {
						signal.set(value + 1);
					}
				}
			},
			EffectTiming::Layout,
		);

		assert_eq!(signal.get_untracked(), 1);
	}
}
