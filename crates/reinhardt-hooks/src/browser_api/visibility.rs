//! Page visibility: use_document_visibility and use_visibility_listener

use std::rc::Rc;

use reinhardt_reactive::Signal;

use super::event_listener::{EventListener, ListenerConfig, ListenerTarget, use_event_listener};
use crate::platform::{self, Platform};

/// Live page visibility
pub struct DocumentVisibility {
	visible: Signal<bool>,
	_listener: EventListener,
}

impl DocumentVisibility {
	/// Whether the document is visible (tracked)
	pub fn is_visible(&self) -> bool {
		self.visible.get()
	}

	/// The underlying signal
	pub fn signal(&self) -> Signal<bool> {
		self.visible.clone()
	}
}

fn subscribe<F>(platform: Rc<dyn Platform>, on_load: bool, on_change: F) -> EventListener
where
	F: Fn(bool) + 'static,
{
	let on_change = Rc::new(on_change);
	let mut config = ListenerConfig::new({
		let platform = Rc::clone(&platform);
		let on_change = Rc::clone(&on_change);
		move |_| on_change(!platform.document_hidden())
	})
	.target(ListenerTarget::Document);

	if on_load {
		config = config.on_load(move || on_change(!platform.document_hidden()));
	}
	use_event_listener("visibilitychange", config)
}

/// Tracks whether the document is visible.
///
/// Starts `false` and reads the real state once the listener is attached, so
/// server renders report a hidden page.
pub fn use_document_visibility() -> DocumentVisibility {
	let visible = Signal::new(false);
	let listener = subscribe(platform::current(), true, {
		let visible = visible.clone();
		move |is_visible| {
			visible.set_if_changed(is_visible);
		}
	});
	DocumentVisibility {
		visible,
		_listener: listener,
	}
}

/// Calls `on_change(is_visible)` on every visibility change, without state
pub fn use_visibility_listener<F>(on_change: F) -> EventListener
where
	F: Fn(bool) + 'static,
{
	subscribe(platform::current(), false, on_change)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use core::cell::RefCell;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_reads_state_on_mount_and_follows_changes() {
		let mock = MockPlatform::install();
		let visibility = use_document_visibility();
		assert!(visibility.is_visible());

		mock.set_document_hidden(true);
		assert!(!visibility.is_visible());
	}

	#[test]
	#[serial]
	fn test_headless_reports_hidden() {
		crate::platform::reset_platform();
		let visibility = use_document_visibility();
		assert!(!visibility.is_visible());
	}

	#[test]
	#[serial]
	fn test_listener_reports_changes_only() {
		let mock = MockPlatform::install();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let _listener = use_visibility_listener({
			let seen = Rc::clone(&seen);
			move |visible| seen.borrow_mut().push(visible)
		});
		assert!(seen.borrow().is_empty());

		mock.set_document_hidden(true);
		mock.set_document_hidden(false);
		assert_eq!(*seen.borrow(), vec![false, true]);
	}
}
