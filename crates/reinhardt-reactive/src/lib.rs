//! Fine-grained reactive runtime for Reinhardt hooks.
//!
//! - [`Signal`]: a value that records who reads it and notifies them on write
//! - [`Effect`]: a side effect that re-runs when what it read changes, with an
//!   optional [`Cleanup`] between runs
//! - [`Memo`]: a lazily cached derived value
//! - [`hooks`]: React-style entry points (`use_state`, `use_effect`, ...)
//!
//! Passive effects are batched. Call [`flush_effects`] to run them, or install a
//! scheduler with [`set_scheduler`] so the platform flushes them automatically.

pub mod effect;
pub mod hooks;
pub mod memo;
pub mod runtime;
pub mod signal;

pub use effect::{Cleanup, Effect};
pub use hooks::{
	Dispatch, SetState, use_effect, use_effect_with_cleanup, use_layout_effect, use_memo,
	use_reducer, use_state,
};
pub use memo::Memo;
pub use runtime::{
	EffectTiming, NodeId, clear_scheduler, flush_effects, has_pending_effects, set_scheduler,
	untrack, with_runtime,
};
pub use signal::Signal;
