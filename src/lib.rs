//! # Reinhardt UI
//!
//! Reactive UI-state hooks for Reinhardt frontends.
//!
//! The crate is a facade over two workspace members:
//!
//! - [`reactive`]: signals, effects and memos
//! - [`hooks`]: hooks that keep reactive state in sync with browser APIs,
//!   timers and DOM elements
//!
//! ## Feature Flags
//!
//! - `hooks` - the hook collection (`reinhardt-hooks`)
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reinhardt_ui::prelude::*;
//!
//! let (page, set_page) = use_state(1_u64);
//! let pagination = use_pagination(PaginateOptions::default().total(95));
//!
//! let _autosave = use_interval(|| tracing::debug!("saving draft"), Duration::from_secs(30));
//!
//! if pagination.get().next_page.is_some() {
//!     set_page.update(|page| page + 1);
//! }
//! ```

pub mod reactive;

#[cfg(feature = "hooks")]
pub mod hooks;

pub use reinhardt_reactive::{Cleanup, Effect, Memo, Signal, flush_effects};

/// Prelude of the most used types and hooks
pub mod prelude {
	pub use core::time::Duration;

	pub use reinhardt_reactive::{
		Cleanup, Effect, Memo, Signal, use_effect, use_effect_with_cleanup, use_memo, use_reducer,
		use_state,
	};

	#[cfg(feature = "hooks")]
	pub use reinhardt_hooks::{
		browser_api::{
			use_connection, use_dark_mode, use_document_visibility, use_event_listener,
			use_local_storage, use_media_query, use_session_storage, use_wake_lock,
		},
		dom_api::{InViewOptions, use_focus_trap, use_in_view, use_scroll_block},
		misc::{PaginateOptions, use_input, use_pagination, use_selection},
		platform::NodeRef,
		timers::{use_debounce, use_interval, use_timeout},
	};
}
