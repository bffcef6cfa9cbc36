//! Memo - Cached Derived Values
//!
//! A `Memo<T>` caches the result of a computation over other signals. It is
//! lazy: the computation runs on the first read and again on the first read
//! after any dependency changed. Reading a memo inside an Effect makes the
//! effect depend on it, so the effect re-runs when the memo is invalidated.
//!
//! ```ignore
//! use reinhardt_reactive::{Memo, Signal};
//!
//! let count = Signal::new(2);
//! let doubled = Memo::new({
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! assert_eq!(doubled.get(), 4);
//! count.set(5);
//! assert_eq!(doubled.get(), 10);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{EffectTiming, NodeId, NodeType, Observer, try_with_runtime, with_runtime};

thread_local! {
	static MEMO_DIRTY_FLAGS: RefCell<BTreeMap<NodeId, Rc<Cell<bool>>>> = const { RefCell::new(BTreeMap::new()) };
}

/// Mark a memo dirty if `node_id` belongs to one.
///
/// Returns `false` when the node is not a memo.
pub(crate) fn mark_memo_dirty(node_id: NodeId) -> bool {
	MEMO_DIRTY_FLAGS
		.try_with(|flags| match flags.borrow().get(&node_id) {
			Some(dirty) => {
				dirty.set(true);
				true
			}
			None => false,
		})
		.unwrap_or(false)
}

struct MemoInner<T> {
	id: NodeId,
	compute: RefCell<Box<dyn FnMut() -> T>>,
	value: RefCell<Option<T>>,
	dirty: Rc<Cell<bool>>,
}

impl<T> Drop for MemoInner<T> {
	fn drop(&mut self) {
		let _ = MEMO_DIRTY_FLAGS.try_with(|flags| flags.borrow_mut().remove(&self.id));
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));
	}
}

/// A lazily computed, cached value derived from other signals
///
/// Clones share the same cache.
pub struct Memo<T: 'static> {
	inner: Rc<MemoInner<T>>,
}

impl<T: Clone + 'static> Memo<T> {
	/// Create a memo over `compute`
	pub fn new<F>(compute: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		let id = NodeId::new();
		let dirty = Rc::new(Cell::new(true));
		MEMO_DIRTY_FLAGS.with(|flags| flags.borrow_mut().insert(id, dirty.clone()));

		Self {
			inner: Rc::new(MemoInner {
				id,
				compute: RefCell::new(Box::new(compute)),
				value: RefCell::new(None),
				dirty,
			}),
		}
	}

	/// Get the current value, recomputing if a dependency changed
	///
	/// Tracks the memo as a dependency of the current observer.
	pub fn get(&self) -> T {
		with_runtime(|rt| rt.track_dependency(self.inner.id));
		self.get_untracked()
	}

	/// Get the current value without tracking the memo itself
	pub fn get_untracked(&self) -> T {
		if let Some(value) = self.cached() {
			return value;
		}

		let id = self.inner.id;
		with_runtime(|rt| {
			rt.clear_dependencies(id);
			rt.push_observer(Observer {
				id,
				node_type: NodeType::Memo,
				timing: EffectTiming::default(),
			});
		});

		let value = (self.inner.compute.borrow_mut())();

		with_runtime(|rt| {
			rt.pop_observer();
		});

		self.inner.dirty.set(false);
		*self.inner.value.borrow_mut() = Some(value.clone());
		value
	}

	/// Whether the next read will recompute
	pub fn is_dirty(&self) -> bool {
		self.inner.dirty.get()
	}

	/// Force the next read to recompute and notify dependents
	pub fn mark_dirty(&self) {
		self.inner.dirty.set(true);
		with_runtime(|rt| rt.notify_signal_change(self.inner.id));
	}

	/// Get the NodeId of this memo
	pub fn id(&self) -> NodeId {
		self.inner.id
	}

	fn cached(&self) -> Option<T> {
		if self.inner.dirty.get() {
			return None;
		}
		self.inner.value.borrow().clone()
	}
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("id", &self.inner.id)
			.field("value", &*self.inner.value.borrow())
			.field("dirty", &self.inner.dirty.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::effect::Effect;
	use crate::runtime::flush_effects;
	use crate::signal::Signal;
	use serial_test::serial;

	fn counted_double(source: &Signal<i32>, calls: &Rc<Cell<usize>>) -> Memo<i32> {
		let source = source.clone();
		let calls = calls.clone();
		Memo::new(move || {
			calls.set(calls.get() + 1);
			source.get() * 2
		})
	}

	#[test]
	#[serial]
	fn test_memo_is_lazy_and_cached() {
		let count = Signal::new(2);
		let calls = Rc::new(Cell::new(0));
		let doubled = counted_double(&count, &calls);

		assert_eq!(calls.get(), 0);
		assert_eq!(doubled.get(), 4);
		assert_eq!(doubled.get(), 4);
		assert_eq!(calls.get(), 1);
	}

	#[test]
	#[serial]
	fn test_memo_recomputes_after_dependency_change() {
		let count = Signal::new(2);
		let calls = Rc::new(Cell::new(0));
		let doubled = counted_double(&count, &calls);

		assert_eq!(doubled.get(), 4);
		count.set(5);
		assert!(doubled.is_dirty());
		assert_eq!(doubled.get(), 10);
		assert_eq!(calls.get(), 2);
	}

	#[test]
	#[serial]
	fn test_effect_reading_memo_reruns_on_change() {
		let count = Signal::new(1);
		let calls = Rc::new(Cell::new(0));
		let doubled = counted_double(&count, &calls);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let _effect = Effect::new({
			let doubled = doubled.clone();
			let seen = seen.clone();
			move || seen.borrow_mut().push(doubled.get())
		});

		count.set(3);
		flush_effects();

		assert_eq!(*seen.borrow(), vec![2, 6]);
	}

	#[test]
	#[serial]
	fn test_mark_dirty_forces_recompute() {
		let count = Signal::new(1);
		let calls = Rc::new(Cell::new(0));
		let doubled = counted_double(&count, &calls);

		let _ = doubled.get();
		doubled.mark_dirty();
		let _ = doubled.get();

		assert_eq!(calls.get(), 2);
	}
}
