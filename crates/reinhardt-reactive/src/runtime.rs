//! Reactive Runtime
//!
//! This module provides the core reactive runtime for managing Signal dependencies,
//! Effect execution, and update scheduling.
//!
//! ## Architecture
//!
//! 1. **Observer Stack**: Tracks the currently executing Effect or Memo
//! 2. **Dependency Tracking**: `Signal::get()` records an edge to the current observer
//! 3. **Update Scheduling**: Passive effects are queued and flushed in one batch
//! 4. **Memo Propagation**: Memo subscribers are marked dirty and their own
//!    subscribers are notified in turn
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::{Effect, Signal, flush_effects};
//!
//! let count = Signal::new(0);
//!
//! let _effect = Effect::new({
//!     let count = count.clone();
//!     move || println!("Count is: {}", count.get())
//! });
//!
//! count.set(42);
//! flush_effects();
//! ```

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};

use std::collections::BTreeMap;
use std::rc::Rc;

/// Unique identifier for reactive nodes (Signals, Effects, Memos)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Type of reactive node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
	/// A Signal node (source of reactivity)
	Signal,
	/// An Effect node (side effect that runs when dependencies change)
	Effect,
	/// A Memo node (cached computation)
	Memo,
}

/// Effect execution timing.
///
/// - Layout effects run synchronously inside the `set()` that invalidated them
/// - Passive effects are queued and run on the next flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTiming {
	/// Runs synchronously when a dependency changes
	Layout,
	/// Runs on the next flush of pending updates
	#[default]
	Passive,
}

/// Observer represents a currently executing Effect or Memo
#[derive(Debug, Clone, Copy)]
pub struct Observer {
	/// Unique identifier for this observer
	pub id: NodeId,
	/// Type of this observer
	pub node_type: NodeType,
	/// Effect execution timing (only used for Effect nodes)
	pub timing: EffectTiming,
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of nodes that depend on this node
	pub(crate) subscribers: Vec<NodeId>,
	/// IDs of nodes this node depends on
	pub(crate) dependencies: Vec<NodeId>,
}

/// Type for the flush scheduler function
type SchedulerFn = Rc<dyn Fn(Box<dyn FnOnce()>)>;

thread_local! {
	static SCHEDULER: RefCell<Option<SchedulerFn>> = const { RefCell::new(None) };
}

/// Set the scheduler used to flush passive effects.
///
/// Without a scheduler, pending effects stay queued until [`flush_effects`] is
/// called. Browser platforms install one backed by a microtask.
///
/// ```ignore
/// reinhardt_reactive::set_scheduler(|task| {
///     wasm_bindgen_futures::spawn_local(async move { task() });
/// });
/// ```
pub fn set_scheduler<F>(scheduler: F)
where
	F: Fn(Box<dyn FnOnce()>) + 'static,
{
	SCHEDULER.with(|slot| *slot.borrow_mut() = Some(Rc::new(scheduler)));
}

/// Remove a previously installed scheduler.
pub fn clear_scheduler() {
	let _ = SCHEDULER.try_with(|slot| slot.borrow_mut().take());
}

/// Reactive runtime
///
/// Manages the dependency graph and update scheduling. One instance lives in
/// thread-local storage per thread.
pub struct Runtime {
	/// Observer stack for tracking currently executing effects
	observer_stack: RefCell<Vec<Observer>>,
	/// Dependency graph: NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Pending updates (nodes that need to be re-executed)
	pub(crate) pending_updates: RefCell<Vec<NodeId>>,
	/// Whether a scheduled flush is outstanding
	pub(crate) update_scheduled: Cell<bool>,
	/// Whether a flush is currently running on this thread
	flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			pending_updates: RefCell::new(Vec::new()),
			update_scheduled: Cell::new(false),
			flushing: Cell::new(false),
		}
	}

	/// Get the current observer (the currently executing Effect or Memo)
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack
			.borrow()
			.last()
			.map(|observer| observer.id)
	}

	/// Push an observer onto the stack
	pub fn push_observer(&self, observer: Observer) {
		self.observer_stack.borrow_mut().push(observer);
	}

	/// Pop an observer from the stack
	pub fn pop_observer(&self) -> Option<Observer> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Track a dependency between the current observer and a signal
	///
	/// This is called automatically when `Signal::get()` is invoked.
	pub fn track_dependency(&self, signal_id: NodeId) {
		if let Some(observer_id) = self.current_observer() {
			let mut graph = self.dependency_graph.borrow_mut();

			let signal_node = graph.entry(signal_id).or_default();
			if !signal_node.subscribers.contains(&observer_id) {
				signal_node.subscribers.push(observer_id);
			}

			let observer_node = graph.entry(observer_id).or_default();
			if !observer_node.dependencies.contains(&signal_id) {
				observer_node.dependencies.push(signal_id);
			}
		}
	}

	/// Notify that a Signal (or Memo) has changed
	///
	/// Layout effects are executed synchronously, passive effects are queued, and
	/// memo subscribers are marked dirty before their own subscribers are notified.
	pub fn notify_signal_change(&self, signal_id: NodeId) {
		let subscribers = match self.dependency_graph.borrow().get(&signal_id) {
			Some(node) => node.subscribers.clone(),
			None => return,
		};

		let mut layout_effects = Vec::new();
		let mut passive_effects = Vec::new();
		let mut dirty_memos = Vec::new();

		for subscriber_id in subscribers {
			if crate::memo::mark_memo_dirty(subscriber_id) {
				dirty_memos.push(subscriber_id);
				continue;
			}
			match crate::effect::get_effect_timing(subscriber_id) {
				Some(EffectTiming::Layout) => layout_effects.push(subscriber_id),
				Some(EffectTiming::Passive) => passive_effects.push(subscriber_id),
				// Stale edge left behind by a disposed node
				None => {}
			}
		}

		for memo_id in dirty_memos {
			self.notify_signal_change(memo_id);
		}

		for effect_id in layout_effects {
			crate::effect::Effect::execute_effect(effect_id);
		}

		for effect_id in passive_effects {
			self.schedule_update(effect_id);
		}
	}

	/// Queue a node for re-execution on the next flush
	pub fn schedule_update(&self, node_id: NodeId) {
		{
			let mut pending = self.pending_updates.borrow_mut();
			if !pending.contains(&node_id) {
				pending.push(node_id);
			}
		}

		if self.update_scheduled.replace(true) {
			return;
		}

		let scheduler = SCHEDULER
			.try_with(|slot| slot.borrow().clone())
			.ok()
			.flatten();
		if let Some(scheduler) = scheduler {
			scheduler(Box::new(flush_effects));
		}
		// Without a scheduler, updates must be flushed manually
	}

	/// Whether any passive effect is waiting to run
	pub fn has_pending_updates(&self) -> bool {
		!self.pending_updates.borrow().is_empty()
	}

	/// Run every queued effect once.
	///
	/// Effects queued while flushing are left for the next call.
	pub fn flush_updates(&self) {
		self.update_scheduled.set(false);

		let pending = core::mem::take(&mut *self.pending_updates.borrow_mut());

		for node_id in pending {
			crate::effect::Effect::execute_effect(node_id);
		}
	}

	/// Clear dependencies for a node
	///
	/// Called before re-executing an Effect/Memo so stale edges do not survive.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		let dependencies = match graph.get_mut(&node_id) {
			Some(node) => core::mem::take(&mut node.dependencies),
			None => return,
		};

		for dep_id in dependencies {
			if let Some(dep_node) = graph.get_mut(&dep_id) {
				dep_node.subscribers.retain(|&id| id != node_id);
			}
		}
	}

	/// Remove a node from the dependency graph
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.dependency_graph.borrow_mut().remove(&node_id);
		self.pending_updates
			.borrow_mut()
			.retain(|&pending| pending != node_id);
	}

	/// Run `f` with no current observer, so reads inside it are not tracked
	pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
		let saved = core::mem::take(&mut *self.observer_stack.borrow_mut());
		let result = f();
		let mut stack = self.observer_stack.borrow_mut();
		let nested = core::mem::replace(&mut *stack, saved);
		stack.extend(nested);
		result
	}

	/// Check if a node exists in the dependency graph (for testing)
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

// Thread-local runtime instance
//
// In WASM there is only one thread, so this is effectively global.
thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Get a reference to the thread's runtime
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the runtime (safe version for Drop implementations)
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run queued passive effects until the queue is empty.
///
/// Effects that schedule further updates while running are picked up by the
/// same call. A nested call made from inside an effect returns immediately.
pub fn flush_effects() {
	let Some(already_flushing) = try_with_runtime(|rt| rt.flushing.replace(true)) else {
		return;
	};
	if already_flushing {
		return;
	}

	// Reset the flag even if an effect panics
	struct FlushGuard;
	impl Drop for FlushGuard {
		fn drop(&mut self) {
			let _ = try_with_runtime(|rt| rt.flushing.set(false));
		}
	}
	let _guard = FlushGuard;

	while with_runtime(Runtime::has_pending_updates) {
		with_runtime(Runtime::flush_updates);
	}
}

/// Whether any passive effect is waiting for a flush
pub fn has_pending_effects() -> bool {
	try_with_runtime(Runtime::has_pending_updates).unwrap_or(false)
}

/// Run `f` without tracking any signal it reads
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
	with_runtime(|rt| rt.untracked(f))
}
