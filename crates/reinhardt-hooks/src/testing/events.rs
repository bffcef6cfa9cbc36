//! Recording event target for [`MockPlatform`](super::MockPlatform).

use core::cell::{Cell, RefCell};

use crate::platform::{Event, EventTarget, Listener, ListenerOptions};

struct Registration {
	event_type: String,
	listener: Listener,
	options: ListenerOptions,
}

/// An event target that records registrations and dispatches synchronously
#[derive(Default)]
pub struct MockEventTarget {
	registrations: RefCell<Vec<Registration>>,
	adds: Cell<usize>,
	removes: Cell<usize>,
}

impl MockEventTarget {
	/// Create an empty target
	pub fn new() -> Self {
		Self::default()
	}

	/// Invoke every listener registered for the event's type.
	///
	/// `once` listeners are removed before they run.
	pub fn dispatch(&self, event: &Event) {
		let listeners: Vec<Listener> = {
			let mut registrations = self.registrations.borrow_mut();
			let matching = registrations
				.iter()
				.filter(|registration| registration.event_type == event.event_type())
				.map(|registration| registration.listener.clone())
				.collect();
			registrations.retain(|registration| {
				!(registration.options.once && registration.event_type == event.event_type())
			});
			matching
		};

		for listener in listeners {
			listener.call(event);
		}
	}

	/// Listeners currently registered for `event_type`
	pub fn listener_count(&self, event_type: &str) -> usize {
		self.registrations
			.borrow()
			.iter()
			.filter(|registration| registration.event_type == event_type)
			.count()
	}

	/// Listeners currently registered for any type
	pub fn total_listeners(&self) -> usize {
		self.registrations.borrow().len()
	}

	/// `add_event_listener` calls so far
	pub fn add_calls(&self) -> usize {
		self.adds.get()
	}

	/// `remove_event_listener` calls so far
	pub fn remove_calls(&self) -> usize {
		self.removes.get()
	}
}

impl EventTarget for MockEventTarget {
	fn add_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.adds.set(self.adds.get() + 1);
		let mut registrations = self.registrations.borrow_mut();
		// Browsers ignore duplicate (type, listener, capture) registrations
		let duplicate = registrations.iter().any(|registration| {
			registration.event_type == event_type
				&& registration.options.capture == options.capture
				&& registration.listener.ptr_eq(listener)
		});
		if !duplicate {
			registrations.push(Registration {
				event_type: event_type.to_string(),
				listener: listener.clone(),
				options,
			});
		}
	}

	fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.removes.set(self.removes.get() + 1);
		self.registrations.borrow_mut().retain(|registration| {
			!(registration.event_type == event_type
				&& registration.options.capture == options.capture
				&& registration.listener.ptr_eq(listener))
		});
	}
}
