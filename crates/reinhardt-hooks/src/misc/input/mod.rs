//! Form input state: use_input
//!
//! The raw value goes through an optional parser, then an optional validator.
//! Errors become visible once the input is touched: on blur with a value, on
//! submit, or a short while after the user stops typing.

mod reducer;

use core::fmt;
use core::time::Duration;

use std::rc::Rc;

use reinhardt_reactive::{Cleanup, Dispatch, Signal, use_reducer};

pub use reducer::{InputAction, InputState, InputValue, input_reducer};

use super::{UpdateEffect, use_update_effect};
use crate::platform::NodeRef;
use crate::timers::use_light_timeout;

/// Default delay after the last change before the input counts as touched
pub const DEFAULT_TOUCH_TIMEOUT: Duration = Duration::from_millis(600);

pub type ParseHandler<I, O> = Rc<dyn Fn(&I) -> Option<O>>;
pub type ValidateHandler<O> = Rc<dyn Fn(Option<&O>) -> bool>;
pub type ChangeHandler<O> = Rc<dyn Fn(Option<&O>)>;

/// Options of [`use_input`]
///
/// `I` is the raw value type, `O` the parsed one.
pub struct InputOptions<I: 'static, O: 'static = I> {
	/// Element focused by [`Input::focus`]
	pub input_ref: Option<NodeRef>,
	pub initial_value: Option<I>,
	pub touch_timeout: Duration,
	pub validate: Option<ValidateHandler<O>>,
	pub on_change: Option<ChangeHandler<O>>,
	parse: ParseHandler<I, O>,
}

impl<I: Clone + 'static> Default for InputOptions<I, I> {
	fn default() -> Self {
		Self::with_parser(|value: &I| Some(value.clone()))
	}
}

impl<I: 'static, O: 'static> InputOptions<I, O> {
	/// Options whose values go through `parse`
	pub fn with_parser<P>(parse: P) -> Self
	where
		P: Fn(&I) -> Option<O> + 'static,
	{
		Self {
			input_ref: None,
			initial_value: None,
			touch_timeout: DEFAULT_TOUCH_TIMEOUT,
			validate: None,
			on_change: None,
			parse: Rc::new(parse),
		}
	}

	pub fn input_ref(mut self, input_ref: NodeRef) -> Self {
		self.input_ref = Some(input_ref);
		self
	}

	pub fn initial_value(mut self, value: I) -> Self {
		self.initial_value = Some(value);
		self
	}

	pub fn touch_timeout(mut self, touch_timeout: Duration) -> Self {
		self.touch_timeout = touch_timeout;
		self
	}

	/// Validate the parsed value; inputs without a validator are always valid
	pub fn validate<F>(mut self, validate: F) -> Self
	where
		F: Fn(Option<&O>) -> bool + 'static,
	{
		self.validate = Some(Rc::new(validate));
		self
	}

	/// Called with the parsed value on every [`Input::change`]
	pub fn on_change<F>(mut self, on_change: F) -> Self
	where
		F: Fn(Option<&O>) + 'static,
	{
		self.on_change = Some(Rc::new(on_change));
		self
	}
}

impl<I: fmt::Debug + 'static, O: 'static> fmt::Debug for InputOptions<I, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InputOptions")
			.field("input_ref", &self.input_ref)
			.field("initial_value", &self.initial_value)
			.field("touch_timeout", &self.touch_timeout)
			.field("validate", &self.validate.is_some())
			.field("on_change", &self.on_change.is_some())
			.finish_non_exhaustive()
	}
}

/// Handle returned by [`use_input`]
pub struct Input<I: 'static, O: 'static = I> {
	_touch: UpdateEffect,
	state: Signal<InputState<I>>,
	dispatch: Dispatch<InputAction<I>>,
	parse: ParseHandler<I, O>,
	validate: Option<ValidateHandler<O>>,
	on_change: Option<ChangeHandler<O>>,
	input_ref: Option<NodeRef>,
	initial_present: bool,
}

impl<I, O> Input<I, O>
where
	I: InputValue + Clone + 'static,
	O: InputValue + 'static,
{
	/// Parsed value (tracked)
	pub fn value(&self) -> Option<O> {
		self.state
			.with(|state| state.value.as_ref().and_then(|value| (self.parse)(value)))
	}

	/// Raw value (tracked)
	pub fn raw_value(&self) -> Option<I> {
		self.state.with(|state| state.value.clone())
	}

	/// The raw state cell
	pub fn state(&self) -> Signal<InputState<I>> {
		self.state.clone()
	}

	/// Whether errors may be shown (tracked)
	pub fn is_touched(&self) -> bool {
		self.state.with(|state| state.is_touched)
	}

	/// Validator verdict on the parsed value (tracked)
	pub fn is_valid(&self) -> bool {
		let value = self.value();
		self.validate
			.as_ref()
			.is_none_or(|validate| validate(value.as_ref()))
	}

	/// Whether the parsed value is empty (tracked)
	pub fn is_empty(&self) -> bool {
		self.value().is_empty_value()
	}

	/// Invalid and either touched or seeded with an initial value (tracked)
	pub fn has_error(&self) -> bool {
		let valid = self.is_valid();
		(!valid && self.is_touched()) || (self.initial_present && !valid)
	}

	/// Record a user edit and notify `on_change`
	pub fn change(&self, value: I) {
		let parsed = (self.parse)(&value);
		self.dispatch.dispatch(InputAction::Change(Some(value)));
		if let Some(on_change) = &self.on_change {
			on_change(parsed.as_ref());
		}
	}

	/// The input lost focus
	pub fn blur(&self) {
		self.dispatch.dispatch(InputAction::Blur);
	}

	/// Set the value programmatically, without `on_change`
	pub fn set_value(&self, value: I) {
		self.dispatch.dispatch(InputAction::Change(Some(value)));
	}

	/// Mark as touched so validation errors surface
	pub fn submit(&self) {
		self.dispatch.dispatch(InputAction::Touched);
	}

	/// Empty and untouched
	pub fn reset(&self) {
		self.dispatch.dispatch(InputAction::Reset);
	}

	/// Focus the bound input element
	pub fn focus(&self) {
		match self.input_ref.as_ref().and_then(NodeRef::get_untracked) {
			Some(element) => element.focus(),
			None => tracing::debug!("input focus requested without a bound element"),
		}
	}
}

/// Manages the value, touch and validity state of a form input.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::misc::{use_input, InputOptions};
///
/// let age = use_input(
///     InputOptions::with_parser(|raw: &String| raw.trim().parse::<u32>().ok())
///         .validate(|age| age.is_some_and(|age| *age >= 18)),
/// );
///
/// age.change("17".to_string());
/// age.blur();
/// assert!(age.has_error());
/// ```
pub fn use_input<I, O>(options: InputOptions<I, O>) -> Input<I, O>
where
	I: InputValue + Clone + PartialEq + 'static,
	O: InputValue + 'static,
{
	let InputOptions {
		input_ref,
		initial_value,
		touch_timeout,
		validate,
		on_change,
		parse,
	} = options;

	let initial_present = !initial_value.is_empty_value();
	let (state, dispatch) = use_reducer(
		InputState {
			value: initial_value,
			is_touched: false,
		},
		input_reducer,
	);

	// Touch the input once it stops changing for `touch_timeout`
	let touch = use_update_effect(
		{
			let state = state.clone();
			move || state.with(|state| state.value.clone())
		},
		{
			let dispatch = dispatch.clone();
			move |value: &Option<I>| {
				if value.is_empty_value() {
					return Cleanup::none();
				}
				let dispatch = dispatch.clone();
				let timer = use_light_timeout(move || dispatch.dispatch(InputAction::Touched), touch_timeout);
				Cleanup::new(move || drop(timer))
			}
		},
	);

	Input {
		_touch: touch,
		state,
		dispatch,
		parse,
		validate,
		on_change,
		input_ref,
		initial_present,
	}
}
