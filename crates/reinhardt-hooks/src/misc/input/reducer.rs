//! Input state machine

use serde::{Deserialize, Serialize};

/// Values an input can hold.
///
/// Emptiness decides whether blurring or the touch timer marks the input as
/// touched.
pub trait InputValue {
	fn is_empty_value(&self) -> bool;
}

impl InputValue for String {
	fn is_empty_value(&self) -> bool {
		self.trim().is_empty()
	}
}

impl InputValue for &str {
	fn is_empty_value(&self) -> bool {
		self.trim().is_empty()
	}
}

impl InputValue for bool {
	fn is_empty_value(&self) -> bool {
		!*self
	}
}

impl InputValue for f64 {
	fn is_empty_value(&self) -> bool {
		*self == 0.0 || self.is_nan()
	}
}

impl<T: InputValue> InputValue for Option<T> {
	fn is_empty_value(&self) -> bool {
		self.as_ref().is_none_or(InputValue::is_empty_value)
	}
}

impl<T> InputValue for Vec<T> {
	fn is_empty_value(&self) -> bool {
		self.is_empty()
	}
}

macro_rules! impl_input_value_for_integers {
	($($ty:ty),*) => {
		$(
			impl InputValue for $ty {
				fn is_empty_value(&self) -> bool {
					*self == 0
				}
			}
		)*
	};
}

impl_input_value_for_integers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Raw input state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputState<I> {
	pub value: Option<I>,
	pub is_touched: bool,
}

impl<I> Default for InputState<I> {
	fn default() -> Self {
		Self {
			value: None,
			is_touched: false,
		}
	}
}

/// Actions accepted by [`input_reducer`]
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction<I> {
	/// The user interacted enough for errors to show
	Touched,
	Change(Option<I>),
	/// Touched iff the value is non-empty
	Blur,
	/// Back to an empty, untouched input
	Reset,
}

/// Next state of an input after `action`
pub fn input_reducer<I>(state: &InputState<I>, action: InputAction<I>) -> InputState<I>
where
	I: InputValue + Clone,
{
	match action {
		InputAction::Touched => InputState {
			value: state.value.clone(),
			is_touched: true,
		},
		InputAction::Change(value) => InputState {
			value,
			is_touched: state.is_touched,
		},
		InputAction::Blur => InputState {
			value: state.value.clone(),
			is_touched: !state.value.is_empty_value(),
		},
		InputAction::Reset => InputState::default(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn state(value: Option<&str>, is_touched: bool) -> InputState<String> {
		InputState {
			value: value.map(str::to_string),
			is_touched,
		}
	}

	#[rstest]
	#[case::touched(state(None, false), InputAction::Touched, state(None, true))]
	#[case::change_keeps_touch(state(Some("a"), true), InputAction::Change(Some("ab".into())), state(Some("ab"), true))]
	#[case::blur_valued(state(Some("x"), false), InputAction::Blur, state(Some("x"), true))]
	#[case::blur_blank(state(Some("   "), true), InputAction::Blur, state(Some("   "), false))]
	#[case::blur_missing(state(None, true), InputAction::Blur, state(None, false))]
	#[case::reset(state(Some("x"), true), InputAction::Reset, state(None, false))]
	fn test_reducer(
		#[case] current: InputState<String>,
		#[case] action: InputAction<String>,
		#[case] expected: InputState<String>,
	) {
		assert_eq!(input_reducer(&current, action), expected);
	}

	#[rstest]
	#[case(0_i32.is_empty_value(), true)]
	#[case(3_u8.is_empty_value(), false)]
	#[case(false.is_empty_value(), true)]
	#[case(f64::NAN.is_empty_value(), true)]
	#[case(Some(String::from("hi")).is_empty_value(), false)]
	#[case(None::<String>.is_empty_value(), true)]
	#[case(Vec::<u8>::new().is_empty_value(), true)]
	fn test_emptiness(#[case] actual: bool, #[case] expected: bool) {
		assert_eq!(actual, expected);
	}
}
