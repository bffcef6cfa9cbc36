//! Reinhardt Hooks - Reusable UI-state Hooks
//!
//! Each hook is a small adapter that subscribes to an external source (a
//! browser API, a timer, a DOM element), mirrors it into reactive state, and
//! tears the subscription down when its handle is dropped.
//!
//! ## Architecture
//!
//! - [`platform`]: the [`Platform`](platform::Platform) trait every hook talks
//!   to, with browser (wasm32) and headless implementations
//! - [`timers`]: timeouts, intervals, debouncing
//! - [`browser_api`]: event listeners, media queries, visibility,
//!   connectivity, storage, dark mode, wake lock
//! - [`dom_api`]: intersection tracking, focus trapping, scroll blocking
//! - [`misc`]: selection, form input, pagination, deferred callbacks,
//!   lifecycle helpers
//! - [`testing`]: [`MockPlatform`](testing::MockPlatform), a deterministic
//!   platform for tests
//!
//! ## Lifecycle
//!
//! Hooks capture [`platform::current()`] when they are created. Dropping the
//! returned handle is the unmount: it removes listeners, clears timers and
//! disconnects observers. Asynchronous continuations check a
//! [`LivenessToken`](liveness::LivenessToken) before writing state, so nothing
//! is written after teardown.
//!
//! ## Failure model
//!
//! A missing capability (no `IntersectionObserver`, no storage, no wake lock)
//! degrades to a fixed default. Invalid options and failing consumer
//! callbacks are logged through `tracing` and never returned to the caller.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_hooks::browser_api::{use_local_storage, use_media_query};
//! use reinhardt_hooks::dom_api::{use_in_view, InViewOptions};
//! use reinhardt_hooks::platform::NodeRef;
//!
//! let narrow = use_media_query("(max-width: 600px)");
//! let collapsed = use_local_storage("sidebar-collapsed", Some(false));
//!
//! let footer = NodeRef::new();
//! let footer_in_view = use_in_view(footer.clone(), InViewOptions::default().once(true));
//!
//! if narrow.matches() && !footer_in_view.in_view() {
//!     collapsed.set(Some(true));
//! }
//! ```

pub mod browser_api;
pub mod dom_api;
pub mod error;
pub mod liveness;
pub mod misc;
pub mod platform;
pub mod testing;
pub mod timers;

pub use error::{HookError, PlatformError, Result};

// Reactive primitives hooks are built on
pub use reinhardt_reactive::{
	Cleanup, Dispatch, Effect, Memo, SetState, Signal, flush_effects, untrack, use_effect,
	use_effect_with_cleanup, use_layout_effect, use_memo, use_reducer, use_state,
};
