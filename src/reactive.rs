//! Fine-grained reactivity
//!
//! Signals record who reads them, effects re-run when what they read changes,
//! and memos cache derived values.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reinhardt_ui::reactive::{Effect, Signal, flush_effects};
//!
//! let name = Signal::new("world".to_string());
//! let _greet = Effect::new({
//!     let name = name.clone();
//!     move || tracing::info!("hello {}", name.get())
//! });
//!
//! name.set("Reinhardt".to_string());
//! flush_effects();
//! ```

// Re-export all reinhardt-reactive functionality
pub use reinhardt_reactive::*;
