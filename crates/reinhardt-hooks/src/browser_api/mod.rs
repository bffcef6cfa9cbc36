//! Hooks over browser APIs.
//!
//! Event listeners, media queries, page visibility, connectivity,
//! web storage, dark mode and the screen wake lock. Each hook degrades to a
//! sensible constant when the capability is missing from the platform.

mod connection;
mod dark_mode;
mod event_listener;
mod media_query;
mod storage;
mod visibility;
mod wake_lock;

pub use connection::{Connection, ConnectionState, use_connection};
pub use dark_mode::{DARK_MODE_STORAGE_KEY, DARK_SCHEME_QUERY, DarkMode, DarkModeOptions, use_dark_mode};
pub use event_listener::{EventListener, EventTypes, ListenerConfig, ListenerTarget, use_event_listener};
pub use media_query::{
	COARSE_POINTER_QUERY, MediaQuery, PORTRAIT_QUERY, use_is_portrait, use_is_touch_device,
	use_media_query,
};
pub use storage::{StorageSetter, StorageState, use_local_storage, use_session_storage, use_storage};
pub use visibility::{DocumentVisibility, use_document_visibility, use_visibility_listener};
pub use wake_lock::{WakeLock, WakeLockErrorHandler, WakeLockOptions, use_wake_lock};
