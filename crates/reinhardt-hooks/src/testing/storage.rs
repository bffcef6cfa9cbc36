//! In-memory web storage.

use core::cell::{Cell, RefCell};

use std::collections::BTreeMap;

use crate::error::PlatformError;
use crate::platform::Storage;

/// A storage area backed by a map, with a switch to make writes fail
#[derive(Default)]
pub struct MockStorage {
	items: RefCell<BTreeMap<String, String>>,
	fail_writes: Cell<bool>,
}

impl MockStorage {
	/// Raw stored string for `key`
	pub fn item(&self, key: &str) -> Option<String> {
		self.items.borrow().get(key).cloned()
	}

	/// Store a raw string, bypassing the failure switch
	pub fn insert(&self, key: &str, value: &str) {
		self.items
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
	}

	/// Make every later write fail like a full quota
	pub fn set_fail_writes(&self, fail: bool) {
		self.fail_writes.set(fail);
	}

	/// Number of stored keys
	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	/// Whether nothing is stored
	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}
}

impl Storage for MockStorage {
	fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError> {
		Ok(self.item(key))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
		if self.fail_writes.get() {
			return Err(PlatformError::Storage("QuotaExceededError".to_string()));
		}
		self.insert(key, value);
		Ok(())
	}

	fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
		if self.fail_writes.get() {
			return Err(PlatformError::Storage("QuotaExceededError".to_string()));
		}
		self.items.borrow_mut().remove(key);
		Ok(())
	}
}
