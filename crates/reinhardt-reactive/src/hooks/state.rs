//! State hooks: use_state and use_reducer

use core::fmt;

use std::rc::Rc;

use crate::signal::Signal;

/// Setter half of [`use_state`].
///
/// Cloning is cheap; all clones write to the same signal.
pub struct SetState<T: 'static> {
	signal: Signal<T>,
}

impl<T: 'static> SetState<T> {
	/// Replace the state
	pub fn set(&self, value: T) {
		self.signal.set(value);
	}

	/// Compute the next state from the previous one
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&T) -> T,
	{
		let next = self.signal.with_untracked(f);
		self.signal.set(next);
	}

	/// Replace the state, skipping notification when it is unchanged
	pub fn set_if_changed(&self, value: T) -> bool
	where
		T: PartialEq,
	{
		self.signal.set_if_changed(value)
	}
}

impl<T: 'static> Clone for SetState<T> {
	fn clone(&self) -> Self {
		Self {
			signal: self.signal.clone(),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for SetState<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SetState").field(&self.signal).finish()
	}
}

/// Creates a piece of reactive state.
///
/// Returns the signal to read from and a setter.
///
/// ```ignore
/// let (count, set_count) = use_state(0);
/// set_count.update(|n| n + 1);
/// assert_eq!(count.get(), 1);
/// ```
pub fn use_state<T: 'static>(initial: T) -> (Signal<T>, SetState<T>) {
	let signal = Signal::new(initial);
	(
		signal.clone(),
		SetState {
			signal,
		},
	)
}

/// Dispatcher half of [`use_reducer`].
pub struct Dispatch<A: 'static> {
	dispatch: Rc<dyn Fn(A)>,
}

impl<A: 'static> Dispatch<A> {
	/// Apply `action` to the current state
	pub fn dispatch(&self, action: A) {
		(self.dispatch)(action);
	}
}

impl<A: 'static> Clone for Dispatch<A> {
	fn clone(&self) -> Self {
		Self {
			dispatch: Rc::clone(&self.dispatch),
		}
	}
}

/// State managed by a reducer function.
///
/// ```ignore
/// enum Action { Increment, Reset }
///
/// let (count, dispatch) = use_reducer(0, |state: &i32, action: Action| match action {
///     Action::Increment => state + 1,
///     Action::Reset => 0,
/// });
/// dispatch.dispatch(Action::Increment);
/// ```
pub fn use_reducer<S, A, R>(initial: S, reducer: R) -> (Signal<S>, Dispatch<A>)
where
	S: 'static,
	A: 'static,
	R: Fn(&S, A) -> S + 'static,
{
	let state = Signal::new(initial);
	let dispatch = {
		let state = state.clone();
		Rc::new(move |action: A| {
			let next = state.with_untracked(|current| reducer(current, action));
			state.set(next);
		})
	};
	(
		state,
		Dispatch {
			dispatch,
		},
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_use_state_setter_writes_shared_signal() {
		let (count, set_count) = use_state(0);
		set_count.set(5);
		assert_eq!(count.get_untracked(), 5);

		set_count.clone().update(|n| n * 2);
		assert_eq!(count.get_untracked(), 10);
	}

	#[derive(Debug, Clone, Copy)]
	enum Action {
		Add(i32),
		Reset,
	}

	#[rstest]
	#[case(vec![Action::Add(2), Action::Add(3)], 5)]
	#[case(vec![Action::Add(2), Action::Reset, Action::Add(1)], 1)]
	#[serial]
	fn test_use_reducer_applies_actions(#[case] actions: Vec<Action>, #[case] expected: i32) {
		let (state, dispatch) = use_reducer(0, |state: &i32, action: Action| match action {
			Action::Add(n) => state + n,
			Action::Reset => 0,
		});

		for action in actions {
			dispatch.dispatch(action);
		}

		assert_eq!(state.get_untracked(), expected);
	}
}
