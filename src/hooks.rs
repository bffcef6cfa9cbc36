//! UI-state hooks
//!
//! This module provides access to reinhardt-hooks: timers, browser API
//! adapters, DOM helpers and small state machines, all built on the reactive
//! runtime.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reinhardt_ui::hooks::dom_api::use_focus_trap;
//! use reinhardt_ui::hooks::platform::NodeRef;
//!
//! let dialog = NodeRef::new();
//! let trap = use_focus_trap(Some(dialog.clone()));
//! trap.set_focus_trap(None);
//! ```

// Re-export all reinhardt-hooks functionality
pub use reinhardt_hooks::*;
