//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` holds a value and records a dependency whenever it is read
//! from inside an Effect or Memo. Writing notifies every dependent.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 43);
//! ```

use core::cell::RefCell;
use core::fmt;

use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive signal that holds a value and tracks dependencies
///
/// Clones share the same value and node: setting through one clone notifies
/// dependents of all of them.
pub struct Signal<T: 'static> {
	/// Unique identifier for this signal
	id: NodeId,
	/// The actual value, shared via reference counting
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Signal<T> {
	/// Create a new Signal with the given initial value
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get the current value of the signal
	///
	/// This tracks the dependency if called from within an Effect or Memo.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.track();
		self.get_untracked()
	}

	/// Get the current value without tracking dependencies
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the current value, tracking the dependency
	///
	/// Avoids a clone for large or non-`Clone` values.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.track();
		self.with_untracked(f)
	}

	/// Borrow the current value without tracking dependencies
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Set the signal to a new value and notify dependents
	pub fn set(&self, value: T) {
		*self.value.borrow_mut() = value;
		self.notify();
	}

	/// Set the signal only if the new value differs from the current one.
	///
	/// Returns whether dependents were notified.
	pub fn set_if_changed(&self, value: T) -> bool
	where
		T: PartialEq,
	{
		if *self.value.borrow() == value {
			return false;
		}
		self.set(value);
		true
	}

	/// Update the signal's value in place and notify dependents once
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut *self.value.borrow_mut());
		self.notify();
	}

	/// Get the NodeId of this signal
	pub fn id(&self) -> NodeId {
		self.id
	}

	fn track(&self) {
		with_runtime(|rt| rt.track_dependency(self.id));
	}

	fn notify(&self) {
		with_runtime(|rt| rt.notify_signal_change(self.id));
	}
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
		}
	}
}

impl<T: 'static> From<T> for Signal<T> {
	fn from(value: T) -> Self {
		Self::new(value)
	}
}

impl From<&str> for Signal<String> {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl<T: Default + 'static> Default for Signal<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Only the last clone removes the node
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::runtime::{EffectTiming, NodeType, Observer};
	use rstest::rstest;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_signal_creation() {
		let signal = Signal::new(42);
		assert_eq!(signal.get_untracked(), 42);
	}

	#[test]
	#[serial]
	fn test_clone_shares_value_without_clone_bound() {
		struct Handle(Vec<u8>);

		let signal = Signal::new(Handle(vec![1]));
		let copy = signal.clone();

		copy.update(|handle| handle.0.push(2));

		assert_eq!(copy.id(), signal.id());
		assert_eq!(signal.with_untracked(|handle| handle.0.clone()), vec![1, 2]);
	}

	#[test]
	#[serial]
	fn test_signal_update() {
		let signal = Signal::new(0);

		signal.update(|n| *n += 1);
		assert_eq!(signal.get_untracked(), 1);

		signal.update(|n| *n *= 2);
		assert_eq!(signal.get_untracked(), 2);
	}

	#[test]
	#[serial]
	fn test_signal_clone_shares_value() {
		let signal1 = Signal::new(42);
		let signal2 = signal1.clone();

		signal1.set(100);
		assert_eq!(signal2.get_untracked(), 100);
		assert_eq!(signal1.id(), signal2.id());
	}

	#[test]
	#[serial]
	fn test_with_borrows_without_clone() {
		let signal = Signal::new(vec![1, 2, 3]);
		assert_eq!(signal.with(|v| v.len()), 3);
	}

	#[rstest]
	#[case(1, 1, false)]
	#[case(1, 2, true)]
	#[serial]
	fn test_set_if_changed(#[case] initial: i32, #[case] next: i32, #[case] notified: bool) {
		let signal = Signal::new(initial);
		assert_eq!(signal.set_if_changed(next), notified);
		assert_eq!(signal.get_untracked(), next);
	}

	#[test]
	#[serial]
	fn test_signal_dependency_tracking() {
		let signal = Signal::new(42);

		with_runtime(|rt| {
			let observer_id = NodeId::new();
			rt.push_observer(Observer {
				id: observer_id,
				node_type: NodeType::Effect,
				timing: EffectTiming::default(),
			});

			let _ = signal.get();

			rt.pop_observer();

			let graph = rt.dependency_graph.borrow();
			assert!(graph[&signal.id()].subscribers.contains(&observer_id));
		});
	}

	#[test]
	#[serial]
	fn test_last_clone_removes_node() {
		let signal = Signal::new(0);
		let id = signal.id();
		let clone = signal.clone();

		with_runtime(|rt| {
			let observer_id = NodeId::new();
			rt.push_observer(Observer {
				id: observer_id,
				node_type: NodeType::Effect,
				timing: EffectTiming::default(),
			});
			let _ = signal.get();
			rt.pop_observer();
		});

		drop(signal);
		assert!(with_runtime(|rt| rt.has_node(id)));

		drop(clone);
		assert!(!with_runtime(|rt| rt.has_node(id)));
	}
}
