//! Controllable intersection observer.

use core::cell::{Cell, RefCell};

use crate::platform::{Element, IntersectionCallback, IntersectionEntry, IntersectionObserver, ObserverInit};

/// An observer whose ticks are delivered by the test
pub struct MockIntersectionObserver {
	callback: IntersectionCallback,
	init: ObserverInit,
	observed: RefCell<Vec<Element>>,
	disconnect_calls: Cell<usize>,
}

impl MockIntersectionObserver {
	pub(crate) fn new(callback: IntersectionCallback, init: ObserverInit) -> Self {
		Self {
			callback,
			init,
			observed: RefCell::new(Vec::new()),
			disconnect_calls: Cell::new(0),
		}
	}

	/// Deliver a batch of entries, unless disconnected
	pub fn trigger(&self, entries: Vec<IntersectionEntry>) {
		if self.is_disconnected() {
			return;
		}
		(self.callback)(entries);
	}

	/// Options the observer was constructed with
	pub fn init(&self) -> &ObserverInit {
		&self.init
	}

	/// Elements currently observed
	pub fn observed(&self) -> Vec<Element> {
		self.observed.borrow().clone()
	}

	/// Whether `target` is observed
	pub fn is_observing(&self, target: &Element) -> bool {
		self.observed.borrow().contains(target)
	}

	/// Whether `disconnect` has been called
	pub fn is_disconnected(&self) -> bool {
		self.disconnect_calls.get() > 0
	}

	/// How many times `disconnect` has been called
	pub fn disconnect_calls(&self) -> usize {
		self.disconnect_calls.get()
	}
}

impl IntersectionObserver for MockIntersectionObserver {
	fn observe(&self, target: &Element) {
		let mut observed = self.observed.borrow_mut();
		if !observed.contains(target) {
			observed.push(target.clone());
		}
	}

	fn unobserve(&self, target: &Element) {
		self.observed.borrow_mut().retain(|element| element != target);
	}

	fn disconnect(&self) {
		self.disconnect_calls.set(self.disconnect_calls.get() + 1);
		self.observed.borrow_mut().clear();
	}

	fn thresholds(&self) -> Vec<f64> {
		if self.init.thresholds.is_empty() {
			vec![0.0]
		} else {
			self.init.thresholds.clone()
		}
	}
}
