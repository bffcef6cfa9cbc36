//! Interval that only runs while the document is visible

use core::cell::{Cell, RefCell};

use std::rc::{Rc, Weak};

use reinhardt_reactive::Signal;

use super::TimerOptions;
use super::timer::{TimerCore, TimerKind};
use crate::platform::{EventSource, EventTarget, Listener, ListenerOptions, TimerId};

const VISIBILITY_CHANGE: &str = "visibilitychange";

struct VisibleInner {
	timer: Rc<TimerCore>,
	listener: RefCell<Option<Listener>>,
	document: Option<Rc<dyn EventTarget>>,
	subscribed: Cell<bool>,
}

impl VisibleInner {
	fn start(&self) -> Option<TimerId> {
		if !self.subscribed.replace(true) {
			if let (Some(document), Some(listener)) = (&self.document, self.listener.borrow().as_ref()) {
				document.add_event_listener(VISIBILITY_CHANGE, listener, ListenerOptions::default());
			}
		}
		if self.timer.platform().document_hidden() {
			return None;
		}
		Some(self.timer.start())
	}

	fn stop(&self) {
		self.timer.stop();
		if !self.subscribed.replace(false) {
			return;
		}
		if let (Some(document), Some(listener)) = (&self.document, self.listener.borrow().as_ref()) {
			document.remove_event_listener(VISIBILITY_CHANGE, listener, ListenerOptions::default());
		}
	}

	fn on_visibility_change(&self) {
		if self.timer.platform().document_hidden() {
			self.timer.stop();
		} else {
			self.timer.start();
		}
	}
}

impl Drop for VisibleInner {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Handle returned by [`use_interval_when_visible`]
pub struct VisibleInterval {
	inner: Rc<VisibleInner>,
	active: Option<Signal<bool>>,
}

impl VisibleInterval {
	/// Subscribe to visibility changes and start the interval if the page is
	/// visible; returns the timer id when it was armed
	pub fn start(&self) -> Option<TimerId> {
		self.inner.start()
	}

	/// Stop the interval and unsubscribe
	pub fn stop(&self) {
		self.inner.stop();
	}

	/// Whether the interval is running; always `false` for the plain variant
	pub fn is_active(&self) -> bool {
		self.active.as_ref().is_some_and(Signal::get)
	}
}

fn create<F>(callback: F, options: TimerOptions, active: Option<Signal<bool>>) -> VisibleInterval
where
	F: Fn() + 'static,
{
	let timer = TimerCore::new(
		TimerKind::Interval,
		Rc::new(callback),
		options.autoplay(false),
		active.clone(),
	);
	let document = timer.platform().event_target(EventSource::Document);
	let inner = Rc::new(VisibleInner {
		timer,
		listener: RefCell::new(None),
		document,
		subscribed: Cell::new(false),
	});

	let weak: Weak<VisibleInner> = Rc::downgrade(&inner);
	*inner.listener.borrow_mut() = Some(Listener::new(move |_| {
		if let Some(inner) = weak.upgrade() {
			inner.on_visibility_change();
		}
	}));

	if options.autoplay {
		inner.start();
	}
	VisibleInterval { inner, active }
}

/// Runs `callback` every `delay` while the document is visible.
///
/// The interval is stopped when the page becomes hidden and restarted when it
/// becomes visible again.
pub fn use_interval_when_visible<F>(callback: F, options: impl Into<TimerOptions>) -> VisibleInterval
where
	F: Fn() + 'static,
{
	create(callback, options.into(), None)
}

/// [`use_interval_when_visible`] with a reactive `is_active` flag
pub fn use_stateful_interval_when_visible<F>(callback: F, options: impl Into<TimerOptions>) -> VisibleInterval
where
	F: Fn() + 'static,
{
	let options = options.into();
	let active = Signal::new(false);
	create(callback, options, Some(active))
}
