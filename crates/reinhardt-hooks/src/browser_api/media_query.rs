//! Media query tracking: use_media_query and the device helpers built on it

use std::rc::Rc;

use reinhardt_reactive::Signal;

use super::event_listener::{EventListener, ListenerConfig, ListenerTarget, use_event_listener};
use crate::platform::{self, Platform};

/// Query matched by [`use_is_portrait`]
pub const PORTRAIT_QUERY: &str = "(orientation: portrait)";

/// Query matched by [`use_is_touch_device`]
pub const COARSE_POINTER_QUERY: &str = "(pointer: coarse)";

/// Live result of a media query
pub struct MediaQuery {
	query: String,
	matches: Signal<bool>,
	_listener: EventListener,
}

impl MediaQuery {
	/// Whether the query currently matches (tracked)
	pub fn matches(&self) -> bool {
		self.matches.get()
	}

	/// The underlying signal
	pub fn signal(&self) -> Signal<bool> {
		self.matches.clone()
	}

	/// The query string
	pub fn query(&self) -> &str {
		&self.query
	}
}

fn read(platform: &dyn Platform, query: &str) -> bool {
	platform.match_media(query).unwrap_or(false)
}

/// Tracks whether `query` matches.
///
/// The result is read at creation, again when the listener attaches, and on
/// every `change` event of the query list. Without `matchMedia` it stays
/// `false`.
pub fn use_media_query(query: impl Into<String>) -> MediaQuery {
	let query = query.into();
	let platform = platform::current();
	let matches = Signal::new(read(platform.as_ref(), &query));

	let refresh: Rc<dyn Fn()> = {
		let platform = Rc::clone(&platform);
		let matches = matches.clone();
		let query = query.clone();
		Rc::new(move || {
			matches.set_if_changed(read(platform.as_ref(), &query));
		})
	};

	let listener = use_event_listener(
		"change",
		ListenerConfig::new({
			let refresh = Rc::clone(&refresh);
			move |_| refresh()
		})
		.target(ListenerTarget::MediaQuery(query.clone()))
		.on_load(move || refresh()),
	);

	MediaQuery {
		query,
		matches,
		_listener: listener,
	}
}

/// Whether the viewport is in portrait orientation
pub fn use_is_portrait() -> MediaQuery {
	use_media_query(PORTRAIT_QUERY)
}

/// Whether the primary pointer is coarse (touch)
pub fn use_is_touch_device() -> MediaQuery {
	use_media_query(COARSE_POINTER_QUERY)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_follows_change_events() {
		let mock = MockPlatform::install();
		mock.set_media_query("(min-width: 768px)", true);

		let query = use_media_query("(min-width: 768px)");
		assert!(query.matches());

		mock.set_media_query("(min-width: 768px)", false);
		assert!(!query.matches());
	}

	#[test]
	#[serial]
	fn test_device_helpers_use_their_queries() {
		let mock = MockPlatform::install();
		mock.set_media_query(COARSE_POINTER_QUERY, true);

		assert!(use_is_touch_device().matches());
		assert!(!use_is_portrait().matches());
		assert_eq!(use_is_portrait().query(), PORTRAIT_QUERY);
	}

	#[test]
	#[serial]
	fn test_without_match_media_stays_false() {
		let mock = MockPlatform::install();
		mock.set_media_query(PORTRAIT_QUERY, true);
		mock.set_match_media_supported(false);

		let portrait = use_is_portrait();
		assert!(!portrait.matches());
	}

	#[test]
	#[serial]
	fn test_drop_detaches() {
		let mock = MockPlatform::install();
		let query = use_media_query(PORTRAIT_QUERY);
		assert_eq!(mock.media_target(PORTRAIT_QUERY).listener_count("change"), 1);

		drop(query);
		assert_eq!(mock.media_target(PORTRAIT_QUERY).listener_count("change"), 0);
	}
}
