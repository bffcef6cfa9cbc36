//! React-style hook entry points over the reactive primitives.
//!
//! Hooks here are plain functions: there is no component render loop, so
//! "mount" is the call itself and "unmount" is dropping the returned handle.

mod effect;
mod memo;
mod state;

pub use effect::{use_effect, use_effect_with_cleanup, use_layout_effect};
pub use memo::use_memo;
pub use state::{Dispatch, SetState, use_reducer, use_state};
