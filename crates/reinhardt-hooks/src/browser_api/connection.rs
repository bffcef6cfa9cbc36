//! Network connection state: use_connection

use std::rc::Rc;

use reinhardt_reactive::Signal;
use serde::{Deserialize, Serialize};

use super::event_listener::{EventListener, ListenerConfig, use_event_listener};
use crate::platform;

/// Whether the browser reports network access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	#[default]
	Online,
	Offline,
}

impl From<bool> for ConnectionState {
	fn from(online: bool) -> Self {
		if online { Self::Online } else { Self::Offline }
	}
}

/// Live connection state
pub struct Connection {
	state: Signal<ConnectionState>,
	_listener: EventListener,
}

impl Connection {
	/// Current state (tracked)
	pub fn state(&self) -> ConnectionState {
		self.state.get()
	}

	pub fn is_online(&self) -> bool {
		self.state() == ConnectionState::Online
	}

	pub fn is_offline(&self) -> bool {
		self.state() == ConnectionState::Offline
	}

	/// The underlying signal
	pub fn signal(&self) -> Signal<ConnectionState> {
		self.state.clone()
	}
}

/// Tracks `navigator.onLine` through the window `online`/`offline` events
pub fn use_connection() -> Connection {
	let platform = platform::current();
	let state = Signal::new(ConnectionState::Online);

	let refresh: Rc<dyn Fn()> = {
		let state = state.clone();
		Rc::new(move || {
			state.set_if_changed(ConnectionState::from(platform.is_online()));
		})
	};

	let listener = use_event_listener(
		["online", "offline"],
		ListenerConfig::new({
			let refresh = Rc::clone(&refresh);
			move |_| refresh()
		})
		.on_load(move || refresh()),
	);

	Connection {
		state,
		_listener: listener,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_reads_on_load() {
		let mock = MockPlatform::install();
		mock.set_online(false);

		let connection = use_connection();
		assert!(connection.is_offline());
	}

	#[test]
	#[serial]
	fn test_follows_events() {
		let mock = MockPlatform::install();
		let connection = use_connection();
		assert_eq!(connection.state(), ConnectionState::Online);

		mock.set_online(false);
		assert!(connection.is_offline());
		mock.set_online(true);
		assert!(connection.is_online());
	}

	#[test]
	fn test_state_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&ConnectionState::Offline).unwrap(), "\"offline\"");
	}
}
