//! Hooks over DOM elements: intersection tracking, focus trapping and
//! scroll blocking.

mod focus_trap;
mod in_view;
mod scroll_block;

pub use focus_trap::{FocusTrap, TrapTarget, use_focus_trap};
pub use in_view::{Amount, InView, InViewCallback, InViewEvent, InViewOptions, use_in_view};
pub use scroll_block::{ScrollBlock, use_scroll_block};
