//! Generic event subscription: use_event_listener
//!
//! A [`ListenerTarget`] is resolved once per configuration into a uniform
//! [`EventTarget`] handle; from then on the hook only knows how to add and
//! remove listeners. A [`ListenerTarget::Ref`] is tracked, so the listener
//! moves when the reference is re-bound.

use core::fmt;

use std::rc::Rc;

use reinhardt_reactive::{Cleanup, Effect};

use crate::platform::{self, Element, Event, EventSource, EventTarget, Listener, ListenerOptions, NodeRef, Platform};

/// Where a listener is attached
#[derive(Clone, Default)]
pub enum ListenerTarget {
	/// The global window
	#[default]
	Window,
	/// The document
	Document,
	/// A concrete element
	Element(Element),
	/// Whatever the reference currently holds, or the window while it is empty
	Ref(NodeRef),
	/// The `MediaQueryList` built from a query string
	MediaQuery(String),
	/// Any other event target
	Custom(Rc<dyn EventTarget>),
}

impl ListenerTarget {
	/// Resolve to a capability handle; tracks the reference for `Ref`
	pub(crate) fn resolve(&self, platform: &dyn Platform) -> Option<Rc<dyn EventTarget>> {
		match self {
			Self::Window => platform.event_target(EventSource::Window),
			Self::Document => platform.event_target(EventSource::Document),
			Self::Element(element) => platform.event_target(EventSource::Element(element)),
			Self::Ref(node_ref) => match node_ref.get() {
				Some(element) => platform.event_target(EventSource::Element(&element)),
				None => platform.event_target(EventSource::Window),
			},
			Self::MediaQuery(query) => platform.event_target(EventSource::MediaQuery(query)),
			Self::Custom(target) => Some(Rc::clone(target)),
		}
	}
}

impl fmt::Debug for ListenerTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Window => f.write_str("Window"),
			Self::Document => f.write_str("Document"),
			Self::Element(element) => f.debug_tuple("Element").field(element).finish(),
			Self::Ref(node_ref) => f.debug_tuple("Ref").field(&node_ref.get_untracked()).finish(),
			Self::MediaQuery(query) => f.debug_tuple("MediaQuery").field(query).finish(),
			Self::Custom(_) => f.write_str("Custom"),
		}
	}
}

impl From<Element> for ListenerTarget {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<NodeRef> for ListenerTarget {
	fn from(node_ref: NodeRef) -> Self {
		Self::Ref(node_ref)
	}
}

/// One or more event type names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypes(Vec<String>);

impl EventTypes {
	/// The type names, in attach order
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}

impl From<&str> for EventTypes {
	fn from(event_type: &str) -> Self {
		Self(vec![event_type.to_string()])
	}
}

impl From<String> for EventTypes {
	fn from(event_type: String) -> Self {
		Self(vec![event_type])
	}
}

impl From<Vec<String>> for EventTypes {
	fn from(event_types: Vec<String>) -> Self {
		Self(event_types)
	}
}

impl From<Vec<&str>> for EventTypes {
	fn from(event_types: Vec<&str>) -> Self {
		Self(event_types.into_iter().map(str::to_string).collect())
	}
}

impl<const N: usize> From<[&str; N]> for EventTypes {
	fn from(event_types: [&str; N]) -> Self {
		Self(event_types.into_iter().map(str::to_string).collect())
	}
}

/// Configuration of [`use_event_listener`]
#[derive(Clone)]
pub struct ListenerConfig {
	pub target: ListenerTarget,
	pub listener: Listener,
	pub options: ListenerOptions,
	pub on_load: Option<Rc<dyn Fn()>>,
	pub on_clean_up: Option<Rc<dyn Fn()>>,
}

impl ListenerConfig {
	/// A window listener with default options
	pub fn new<F>(listener: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		Self::from_listener(Listener::new(listener))
	}

	/// Reuse an existing listener handle
	pub fn from_listener(listener: Listener) -> Self {
		Self {
			target: ListenerTarget::default(),
			listener,
			options: ListenerOptions::default(),
			on_load: None,
			on_clean_up: None,
		}
	}

	/// Set the target
	pub fn target(mut self, target: impl Into<ListenerTarget>) -> Self {
		self.target = target.into();
		self
	}

	/// Set the listener options
	pub fn options(mut self, options: ListenerOptions) -> Self {
		self.options = options;
		self
	}

	/// Run `on_load` right before the listeners are attached
	pub fn on_load<F>(mut self, on_load: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.on_load = Some(Rc::new(on_load));
		self
	}

	/// Run `on_clean_up` right after the listeners are detached
	pub fn on_clean_up<F>(mut self, on_clean_up: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.on_clean_up = Some(Rc::new(on_clean_up));
		self
	}
}

/// Subscription handle; dropping it detaches every listener
pub struct EventListener {
	effect: Effect,
}

impl EventListener {
	/// Detach now instead of on drop
	pub fn dispose(&self) {
		self.effect.dispose();
	}
}

/// Attaches `config.listener` to `config.target` for every type in `types`.
///
/// If the platform cannot resolve the target (no window, no `matchMedia`),
/// nothing happens: neither `on_load` nor `on_clean_up` run.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::browser_api::{use_event_listener, ListenerConfig, ListenerTarget};
///
/// let _resize = use_event_listener(
///     ["resize", "orientationchange"],
///     ListenerConfig::new(|_| tracing::debug!("viewport changed")),
/// );
///
/// let _escape = use_event_listener(
///     "keydown",
///     ListenerConfig::new(|event| {
///         if event.key() == Some("Escape") {
///             close_modal();
///         }
///     })
///     .target(ListenerTarget::Document),
/// );
/// ```
pub fn use_event_listener(types: impl Into<EventTypes>, config: ListenerConfig) -> EventListener {
	let types = types.into();
	let platform = platform::current();

	let effect = Effect::with_cleanup(move || {
		let Some(target) = config.target.resolve(platform.as_ref()) else {
			tracing::debug!(target = ?config.target, "event target unavailable, listener skipped");
			return Cleanup::none();
		};

		if let Some(on_load) = &config.on_load {
			on_load();
		}
		for event_type in types.as_slice() {
			target.add_event_listener(event_type, &config.listener, config.options);
		}

		let types = types.clone();
		let listener = config.listener.clone();
		let options = config.options;
		let on_clean_up = config.on_clean_up.clone();
		Cleanup::new(move || {
			for event_type in types.as_slice() {
				target.remove_event_listener(event_type, &listener, options);
			}
			if let Some(on_clean_up) = on_clean_up {
				on_clean_up();
			}
		})
	});

	EventListener { effect }
}
