//! Storage-backed state: use_storage, use_local_storage, use_session_storage
//!
//! Values are stored as JSON. Reading happens at mount and whenever the key
//! changes; every write goes through to the storage area. When storage is
//! missing or fails, the state keeps working in memory.

use std::rc::Rc;

use reinhardt_reactive::{Effect, Signal};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{HookError, PlatformError, Result};
use crate::platform::{self, Platform, StorageKind};

fn read<T: DeserializeOwned>(platform: &dyn Platform, kind: StorageKind, key: &str) -> Result<Option<T>> {
	let Some(storage) = platform.storage(kind) else {
		return Err(PlatformError::Unsupported("storage").into());
	};
	match storage.get_item(key)? {
		Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
		None => Ok(None),
	}
}

fn write<T: Serialize>(platform: &dyn Platform, kind: StorageKind, key: &str, value: Option<&T>) -> Result<()> {
	let Some(storage) = platform.storage(kind) else {
		return Err(PlatformError::Unsupported("storage").into());
	};
	match value {
		Some(value) => storage.set_item(key, &serde_json::to_string(value)?)?,
		None => storage.remove_item(key)?,
	}
	Ok(())
}

fn log_failure(operation: &str, kind: StorageKind, key: &str, error: &HookError) {
	match error {
		HookError::Platform(platform) if platform.is_unsupported() => {
			tracing::debug!(kind = kind.as_str(), key = %key, "{operation} skipped, storage unavailable");
		}
		_ => tracing::warn!(kind = kind.as_str(), key = %key, error = %error, "{operation} failed"),
	}
}

/// Write handle of a storage-backed state.
///
/// Cloning is cheap; all clones write the same state and key.
pub struct StorageSetter<T: 'static> {
	value: Signal<Option<T>>,
	key: Signal<String>,
	kind: StorageKind,
	platform: Rc<dyn Platform>,
}

impl<T: 'static> Clone for StorageSetter<T> {
	fn clone(&self) -> Self {
		Self {
			value: self.value.clone(),
			key: self.key.clone(),
			kind: self.kind,
			platform: Rc::clone(&self.platform),
		}
	}
}

impl<T> StorageSetter<T>
where
	T: Serialize + Clone + 'static,
{
	/// Replace the value; `None` removes the key
	pub fn set(&self, value: Option<T>) {
		let key = self.key.get_untracked();
		if let Err(error) = write(self.platform.as_ref(), self.kind, &key, value.as_ref()) {
			log_failure("write", self.kind, &key, &error);
		}
		self.value.set(value);
	}

	/// Compute the next value from the previous one
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(Option<&T>) -> Option<T>,
	{
		let next = self.value.with_untracked(|previous| f(previous.as_ref()));
		self.set(next);
	}
}

/// State synchronized with a storage key
pub struct StorageState<T: 'static> {
	setter: StorageSetter<T>,
	_sync: Effect,
}

impl<T> StorageState<T>
where
	T: Serialize + Clone + 'static,
{
	/// Current value (tracked)
	pub fn value(&self) -> Option<T> {
		self.setter.value.get()
	}

	/// Current value without tracking
	pub fn value_untracked(&self) -> Option<T> {
		self.setter.value.get_untracked()
	}

	/// The underlying signal
	pub fn signal(&self) -> Signal<Option<T>> {
		self.setter.value.clone()
	}

	/// Replace the value; `None` removes the key
	pub fn set(&self, value: Option<T>) {
		self.setter.set(value);
	}

	/// Compute the next value from the previous one
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(Option<&T>) -> Option<T>,
	{
		self.setter.update(f);
	}

	/// A detached write handle
	pub fn setter(&self) -> StorageSetter<T> {
		self.setter.clone()
	}
}

/// Keeps a state in sync with `storage[key]`.
///
/// The stored JSON (or `initial` when there is none) is loaded at mount and
/// again whenever `key` changes. Writes through [`StorageState::set`] are
/// persisted immediately.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::browser_api::use_local_storage;
///
/// let theme = use_local_storage("theme", Some("light".to_string()));
/// theme.set(Some("dark".to_string()));
/// assert_eq!(theme.value().as_deref(), Some("dark"));
/// ```
pub fn use_storage<T>(key: impl Into<Signal<String>>, initial: Option<T>, kind: StorageKind) -> StorageState<T>
where
	T: Serialize + DeserializeOwned + Clone + 'static,
{
	let platform = platform::current();
	let key = key.into();
	let value = Signal::new(initial.clone());

	let sync = Effect::new({
		let platform = Rc::clone(&platform);
		let key = key.clone();
		let value = value.clone();
		move || {
			let key = key.get();
			let stored = match read::<T>(platform.as_ref(), kind, &key) {
				Ok(stored) => stored,
				Err(error) => {
					log_failure("read", kind, &key, &error);
					None
				}
			};
			value.set(stored.or_else(|| initial.clone()));
		}
	});

	StorageState {
		setter: StorageSetter {
			value,
			key,
			kind,
			platform,
		},
		_sync: sync,
	}
}

/// [`use_storage`] on `localStorage`
pub fn use_local_storage<T>(key: impl Into<Signal<String>>, initial: Option<T>) -> StorageState<T>
where
	T: Serialize + DeserializeOwned + Clone + 'static,
{
	use_storage(key, initial, StorageKind::Local)
}

/// [`use_storage`] on `sessionStorage`
pub fn use_session_storage<T>(key: impl Into<Signal<String>>, initial: Option<T>) -> StorageState<T>
where
	T: Serialize + DeserializeOwned + Clone + 'static,
{
	use_storage(key, initial, StorageKind::Session)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use serde::Deserialize;
	use serial_test::serial;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Prefs {
		compact: bool,
		zoom: u8,
	}

	#[test]
	#[serial]
	fn test_round_trip() {
		let mock = MockPlatform::install();
		let state = use_local_storage("name", Some("initial".to_string()));

		state.set(Some("x".to_string()));
		assert_eq!(state.value_untracked().as_deref(), Some("x"));
		assert_eq!(mock.local_storage().item("name").as_deref(), Some("\"x\""));

		let reread = use_local_storage::<String>("name", None);
		assert_eq!(reread.value_untracked().as_deref(), Some("x"));
	}

	#[test]
	#[serial]
	fn test_loads_stored_value_over_initial() {
		let mock = MockPlatform::install();
		mock.session_storage().insert("prefs", r#"{"compact":true,"zoom":3}"#);

		let prefs = use_session_storage("prefs", Some(Prefs { compact: false, zoom: 1 }));
		assert_eq!(prefs.value_untracked(), Some(Prefs { compact: true, zoom: 3 }));
	}

	#[test]
	#[serial]
	fn test_unavailable_storage_keeps_initial() {
		let mock = MockPlatform::install();
		mock.set_storage_available(false);

		let state = use_local_storage("count", Some(7));
		assert_eq!(state.value_untracked(), Some(7));

		state.set(Some(8));
		assert_eq!(state.value_untracked(), Some(8));
		assert!(mock.local_storage().is_empty());
	}

	#[test]
	#[serial]
	fn test_failed_write_stays_in_memory() {
		let mock = MockPlatform::install();
		mock.local_storage().set_fail_writes(true);

		let state = use_local_storage("count", Some(1));
		state.update(|previous| previous.map(|n| n + 1));
		assert_eq!(state.value_untracked(), Some(2));
		assert_eq!(mock.local_storage().item("count"), None);
	}

	#[test]
	#[serial]
	fn test_corrupt_entry_falls_back_to_initial() {
		let mock = MockPlatform::install();
		mock.local_storage().insert("count", "not json");

		let state = use_local_storage("count", Some(0));
		assert_eq!(state.value_untracked(), Some(0));
	}

	#[test]
	#[serial]
	fn test_none_removes_key() {
		let mock = MockPlatform::install();
		let state = use_local_storage("token", Some("abc".to_string()));
		state.set(Some("def".to_string()));

		state.set(None);
		assert_eq!(mock.local_storage().item("token"), None);
		assert_eq!(state.value_untracked(), None);
	}

	#[test]
	#[serial]
	fn test_key_change_rereads() {
		let mock = MockPlatform::install();
		mock.local_storage().insert("a", "1");
		mock.local_storage().insert("b", "2");
		let key = Signal::new("a".to_string());

		let state = use_local_storage::<i32>(key.clone(), None);
		assert_eq!(state.value_untracked(), Some(1));

		key.set("b".to_string());
		mock.flush();
		assert_eq!(state.value_untracked(), Some(2));
	}
}
