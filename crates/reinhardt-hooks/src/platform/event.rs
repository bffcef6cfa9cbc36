//! Events, listeners and event targets.

use core::cell::Cell;
use core::fmt;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::dom::Element;

/// A platform event as seen by hook listeners.
///
/// Carries only the fields hooks read; the raw browser event is kept on wasm
/// so `prevent_default` reaches it.
pub struct Event {
	event_type: String,
	key: Option<String>,
	shift_key: bool,
	matches: Option<bool>,
	default_prevented: Cell<bool>,
	#[cfg(target_arch = "wasm32")]
	raw: Option<web_sys::Event>,
}

impl Event {
	/// An event of the given type with no payload
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			key: None,
			shift_key: false,
			matches: None,
			default_prevented: Cell::new(false),
			#[cfg(target_arch = "wasm32")]
			raw: None,
		}
	}

	/// A `keydown` event for `key`
	pub fn key_down(key: impl Into<String>, shift_key: bool) -> Self {
		Self::new("keydown").with_key(key).with_shift_key(shift_key)
	}

	/// Set the keyboard key
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Set the shift modifier
	pub fn with_shift_key(mut self, shift_key: bool) -> Self {
		self.shift_key = shift_key;
		self
	}

	/// Set the media query match state (`change` events on a media query list)
	pub fn with_matches(mut self, matches: bool) -> Self {
		self.matches = Some(matches);
		self
	}

	#[cfg(target_arch = "wasm32")]
	pub(crate) fn with_raw(mut self, raw: web_sys::Event) -> Self {
		self.raw = Some(raw);
		self
	}

	/// Event type, e.g. `"keydown"`
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// Keyboard key, for keyboard events
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	/// Whether shift was held, for keyboard events
	pub fn shift_key(&self) -> bool {
		self.shift_key
	}

	/// Match state, for media query `change` events
	pub fn matches(&self) -> Option<bool> {
		self.matches
	}

	/// Cancel the platform's default action
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
		#[cfg(target_arch = "wasm32")]
		if let Some(raw) = &self.raw {
			raw.prevent_default();
		}
	}

	/// Whether [`Event::prevent_default`] was called
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("key", &self.key)
			.field("shift_key", &self.shift_key)
			.field("matches", &self.matches)
			.field("default_prevented", &self.default_prevented.get())
			.finish()
	}
}

/// A shared event handler.
///
/// Two listeners are the same listener only if they are clones of each other,
/// which is what `remove_event_listener` matches on.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
	/// Wrap a handler
	pub fn new<F>(handler: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		Self(Rc::new(handler))
	}

	/// Invoke the handler
	pub fn call(&self, event: &Event) {
		(self.0)(event);
	}

	/// Identity comparison
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Listener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Listener")
			.field(&Rc::as_ptr(&self.0).cast::<()>())
			.finish()
	}
}

/// `addEventListener` options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerOptions {
	/// Dispatch during the capture phase
	pub capture: bool,
	/// Remove the listener after its first invocation
	pub once: bool,
	/// Promise not to call `prevent_default`
	pub passive: bool,
}

impl ListenerOptions {
	/// Set `capture`
	pub fn capture(mut self, capture: bool) -> Self {
		self.capture = capture;
		self
	}

	/// Set `once`
	pub fn once(mut self, once: bool) -> Self {
		self.once = once;
		self
	}

	/// Set `passive`
	pub fn passive(mut self, passive: bool) -> Self {
		self.passive = passive;
		self
	}
}

/// Uniform event subscription capability.
///
/// Window, document, elements, media query lists, and wake-lock sentinels all
/// resolve to this.
pub trait EventTarget {
	/// Attach `listener` for `event_type`
	fn add_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions);

	/// Detach a listener previously attached with the same type and capture flag
	fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions);
}

/// What a platform is asked to resolve into an [`EventTarget`]
#[derive(Debug, Clone, Copy)]
pub enum EventSource<'a> {
	/// The global window
	Window,
	/// The document
	Document,
	/// A specific element
	Element(&'a Element),
	/// The media query list for a query string
	MediaQuery(&'a str),
}
