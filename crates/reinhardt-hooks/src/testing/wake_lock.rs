//! Scriptable wake lock.

use core::cell::{Cell, RefCell};

use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};

use super::events::MockEventTarget;
use crate::error::PlatformError;
use crate::platform::{Event, EventTarget, Listener, ListenerOptions, WakeLockApi, WakeLockSentinel};

/// Wake lock API that grants every request unless told to reject
#[derive(Default)]
pub struct MockWakeLock {
	requests: Cell<usize>,
	reject_with: RefCell<Option<PlatformError>>,
	sentinels: RefCell<Vec<Rc<MockWakeLockSentinel>>>,
}

impl MockWakeLock {
	/// Reject later requests with `error` (`None` grants them again)
	pub fn reject_with(&self, error: Option<PlatformError>) {
		*self.reject_with.borrow_mut() = error;
	}

	/// Number of `request` calls so far
	pub fn requests(&self) -> usize {
		self.requests.get()
	}

	/// Every sentinel handed out, oldest first
	pub fn sentinels(&self) -> Vec<Rc<MockWakeLockSentinel>> {
		self.sentinels.borrow().clone()
	}

	/// Sentinels not yet released
	pub fn held(&self) -> usize {
		self.sentinels
			.borrow()
			.iter()
			.filter(|sentinel| !sentinel.released())
			.count()
	}
}

impl WakeLockApi for MockWakeLock {
	fn request(&self) -> LocalBoxFuture<'static, Result<Rc<dyn WakeLockSentinel>, PlatformError>> {
		self.requests.set(self.requests.get() + 1);
		let result = match self.reject_with.borrow().clone() {
			Some(error) => Err(error),
			None => {
				let sentinel = Rc::new(MockWakeLockSentinel::default());
				self.sentinels.borrow_mut().push(Rc::clone(&sentinel));
				Ok(sentinel as Rc<dyn WakeLockSentinel>)
			}
		};
		Box::pin(future::ready(result))
	}
}

/// A granted lock
#[derive(Default)]
pub struct MockWakeLockSentinel {
	released: Cell<bool>,
	release_calls: Cell<usize>,
	events: MockEventTarget,
}

impl MockWakeLockSentinel {
	/// Release from the platform side, as when the page is hidden
	pub fn system_release(&self) {
		if !self.released.replace(true) {
			self.events.dispatch(&Event::new("release"));
		}
	}

	/// `release` calls made by the page
	pub fn release_calls(&self) -> usize {
		self.release_calls.get()
	}

	/// Listeners attached to the sentinel
	pub fn listener_count(&self) -> usize {
		self.events.total_listeners()
	}
}

impl EventTarget for MockWakeLockSentinel {
	fn add_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.events.add_event_listener(event_type, listener, options);
	}

	fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.events.remove_event_listener(event_type, listener, options);
	}
}

impl WakeLockSentinel for MockWakeLockSentinel {
	fn released(&self) -> bool {
		self.released.get()
	}

	fn release(&self) -> LocalBoxFuture<'static, Result<(), PlatformError>> {
		self.release_calls.set(self.release_calls.get() + 1);
		self.system_release();
		Box::pin(future::ready(Ok(())))
	}
}
