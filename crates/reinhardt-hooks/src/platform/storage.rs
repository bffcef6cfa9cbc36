//! Key/value web storage.

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Which storage area to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
	/// Persists across sessions (`localStorage`)
	#[default]
	Local,
	/// Cleared when the session ends (`sessionStorage`)
	Session,
}

impl StorageKind {
	/// The browser global's name
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Local => "localStorage",
			Self::Session => "sessionStorage",
		}
	}
}

/// A string key/value store
pub trait Storage {
	/// Read `key`
	fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError>;

	/// Write `key`
	fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError>;

	/// Delete `key`
	fn remove_item(&self, key: &str) -> Result<(), PlatformError>;
}
