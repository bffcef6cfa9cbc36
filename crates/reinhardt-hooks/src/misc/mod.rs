//! Small state machines and lifecycle helpers.

mod defer_callback;
mod input;
mod lifecycle;
mod pagination;
mod selection;

pub use defer_callback::{DeferredCallback, use_defer_callback};
pub use input::{
	ChangeHandler, DEFAULT_TOUCH_TIMEOUT, Input, InputAction, InputOptions, InputState, InputValue,
	ParseHandler, ValidateHandler, input_reducer, use_input,
};
pub use lifecycle::{
	EffectOnce, FirstRender, UpdateEffect, use_effect_once, use_is_client, use_is_first_render,
	use_update_effect,
};
pub use pagination::{PaginateOptions, Pagination, paginate, use_pagination, use_pagination_with};
pub use selection::{Selection, use_selection};
