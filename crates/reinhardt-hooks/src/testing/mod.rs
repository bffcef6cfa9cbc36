//! Deterministic test platform.
//!
//! [`MockPlatform`] replaces the browser with in-memory state the test
//! controls:
//!
//! - a virtual clock: timers fire only inside [`MockPlatform::advance`]
//! - a local executor: spawned tasks and passive effects run in
//!   [`MockPlatform::flush`]
//! - a small DOM with document-wide focus and keyboard emulation
//! - event targets for the window, the document, elements and media queries
//! - intersection observers, storage areas and a wake lock, each of which
//!   can be switched off to exercise unsupported environments
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use reinhardt_hooks::testing::MockPlatform;
//! use reinhardt_hooks::timers::use_timeout;
//!
//! let mock = MockPlatform::install();
//! let timer = use_timeout(|| println!("fired"), Duration::from_millis(100));
//! mock.advance(Duration::from_millis(100));
//! ```

mod dom;
mod events;
mod observer;
mod storage;
mod wake_lock;

use core::cell::{Cell, RefCell};
use core::time::Duration;

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

pub use dom::MockNode;
pub use events::MockEventTarget;
pub use observer::MockIntersectionObserver;
pub use storage::MockStorage;
pub use wake_lock::{MockWakeLock, MockWakeLockSentinel};

use dom::DomTree;

use crate::error::PlatformError;
use crate::platform::{
	self, Element, Event, EventSource, EventTarget, IntersectionCallback, IntersectionEntry,
	IntersectionObserver, ObserverInit, Platform, Storage, StorageKind, TimerId, WakeLockApi,
};

/// Rounds of effect flushing and task polling before [`MockPlatform::flush`] gives up
const MAX_FLUSH_ROUNDS: usize = 1_000;

enum TimerTask {
	Timeout(Box<dyn FnOnce()>),
	Interval { callback: Rc<dyn Fn()>, period: Duration },
}

struct MockTimer {
	due: Duration,
	task: TimerTask,
}

/// Calls made to the timer API so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerCalls {
	pub set_timeout: usize,
	pub clear_timeout: usize,
	pub set_interval: usize,
	pub clear_interval: usize,
}

struct Capabilities {
	client: Cell<bool>,
	match_media: Cell<bool>,
	intersection_observer: Cell<bool>,
	storage: Cell<bool>,
	wake_lock: Cell<bool>,
}

impl Default for Capabilities {
	fn default() -> Self {
		Self {
			client: Cell::new(true),
			match_media: Cell::new(true),
			intersection_observer: Cell::new(true),
			storage: Cell::new(true),
			wake_lock: Cell::new(true),
		}
	}
}

/// A fully controllable [`Platform`]
pub struct MockPlatform {
	capabilities: Capabilities,

	now: Cell<Duration>,
	next_timer: Cell<i64>,
	timers: RefCell<BTreeMap<i64, MockTimer>>,
	timer_calls: Cell<TimerCalls>,

	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,

	tree: Rc<DomTree>,
	html: Element,
	body: Element,

	window: Rc<MockEventTarget>,
	document: Rc<MockEventTarget>,
	element_targets: RefCell<BTreeMap<usize, Rc<MockEventTarget>>>,
	media_targets: RefCell<BTreeMap<String, Rc<MockEventTarget>>>,
	media: RefCell<BTreeMap<String, bool>>,

	observers: RefCell<Vec<Rc<MockIntersectionObserver>>>,

	local: Rc<MockStorage>,
	session: Rc<MockStorage>,
	wake_lock: Rc<MockWakeLock>,

	hidden: Cell<bool>,
	online: Cell<bool>,
	scrollbar_width: Cell<f64>,
}

impl MockPlatform {
	/// Create a mock platform without installing it
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		let tree = Rc::new(DomTree::default());
		let html = tree.create("html");
		let body = tree.create("body");
		tree.append_child(node_id(&html), node_id(&body));

		Self {
			capabilities: Capabilities::default(),
			now: Cell::new(Duration::ZERO),
			next_timer: Cell::new(1),
			timers: RefCell::new(BTreeMap::new()),
			timer_calls: Cell::new(TimerCalls::default()),
			pool: RefCell::new(pool),
			spawner,
			tree,
			html,
			body,
			window: Rc::new(MockEventTarget::new()),
			document: Rc::new(MockEventTarget::new()),
			element_targets: RefCell::new(BTreeMap::new()),
			media_targets: RefCell::new(BTreeMap::new()),
			media: RefCell::new(BTreeMap::new()),
			observers: RefCell::new(Vec::new()),
			local: Rc::new(MockStorage::default()),
			session: Rc::new(MockStorage::default()),
			wake_lock: Rc::new(MockWakeLock::default()),
			hidden: Cell::new(false),
			online: Cell::new(true),
			scrollbar_width: Cell::new(0.0),
		}
	}

	/// Create a mock platform and make it the current platform of this thread
	pub fn install() -> Rc<Self> {
		reinhardt_reactive::clear_scheduler();
		let mock = Rc::new(Self::new());
		platform::set_platform(Rc::clone(&mock) as Rc<dyn Platform>);
		mock
	}

	// ------------------------------------------------------------------
	// Clock
	// ------------------------------------------------------------------

	/// Virtual time elapsed since creation
	pub fn now(&self) -> Duration {
		self.now.get()
	}

	/// Move the clock forward, firing due timers in order.
	///
	/// Pending work is flushed before the first timer and after every timer.
	pub fn advance(&self, by: Duration) {
		let target = self.now.get() + by;
		self.flush();

		loop {
			let next = self
				.timers
				.borrow()
				.iter()
				.filter(|(_, timer)| timer.due <= target)
				.min_by_key(|(id, timer)| (timer.due, **id))
				.map(|(id, timer)| (*id, timer.due));
			let Some((id, due)) = next else {
				break;
			};

			self.now.set(due.max(self.now.get()));
			self.fire(id);
			self.flush();
		}

		self.now.set(target);
	}

	fn fire(&self, id: i64) {
		enum Due {
			Once(Box<dyn FnOnce()>),
			Repeat(Rc<dyn Fn()>),
		}

		let due = {
			let mut timers = self.timers.borrow_mut();
			let repeat = match timers.get_mut(&id) {
				Some(MockTimer {
					due,
					task: TimerTask::Interval { callback, period },
				}) => {
					*due += *period;
					Some(Rc::clone(callback))
				}
				_ => None,
			};
			match repeat {
				Some(callback) => Some(Due::Repeat(callback)),
				None => timers.remove(&id).and_then(|timer| match timer.task {
					TimerTask::Timeout(callback) => Some(Due::Once(callback)),
					TimerTask::Interval { .. } => None,
				}),
			}
		};

		match due {
			Some(Due::Once(callback)) => callback(),
			Some(Due::Repeat(callback)) => callback(),
			None => {}
		}
	}

	/// Timers currently armed
	pub fn active_timers(&self) -> usize {
		self.timers.borrow().len()
	}

	/// Calls made to the timer API so far
	pub fn timer_calls(&self) -> TimerCalls {
		self.timer_calls.get()
	}

	fn count_timer_call(&self, f: impl FnOnce(&mut TimerCalls)) {
		let mut calls = self.timer_calls.get();
		f(&mut calls);
		self.timer_calls.set(calls);
	}

	// ------------------------------------------------------------------
	// Executor
	// ------------------------------------------------------------------

	/// Run passive effects and spawned tasks until nothing is left to do
	pub fn flush(&self) {
		for _ in 0..MAX_FLUSH_ROUNDS {
			reinhardt_reactive::flush_effects();
			if let Ok(mut pool) = self.pool.try_borrow_mut() {
				pool.run_until_stalled();
			}
			if !reinhardt_reactive::has_pending_effects() {
				return;
			}
		}
		tracing::warn!(rounds = MAX_FLUSH_ROUNDS, "mock platform flush did not settle");
	}

	// ------------------------------------------------------------------
	// DOM
	// ------------------------------------------------------------------

	/// The `<html>` element
	pub fn html(&self) -> Element {
		self.html.clone()
	}

	/// The `<body>` element
	pub fn body(&self) -> Element {
		self.body.clone()
	}

	/// Create a detached element
	pub fn create_element(&self, tag: &str) -> Element {
		self.tree.create(tag)
	}

	/// Create an element with attributes and append it to `parent`
	pub fn append(&self, parent: &Element, tag: &str, attributes: &[(&str, &str)]) -> Element {
		let element = self.tree.create(tag);
		for (name, value) in attributes {
			element.set_attribute(name, value);
		}
		self.append_child(parent, &element);
		element
	}

	/// Move `child` under `parent`
	pub fn append_child(&self, parent: &Element, child: &Element) {
		self.tree.append_child(node_id(parent), node_id(child));
	}

	/// The focused element, if any
	pub fn focused(&self) -> Option<Element> {
		self.tree.focused()
	}

	/// Remove focus from the document
	pub fn blur(&self) {
		self.tree.blur();
	}

	/// Total `focus()` calls made on any element
	pub fn focus_calls(&self) -> usize {
		self.tree.focus_calls()
	}

	/// Whether `element` carries `class`
	pub fn has_class(&self, element: &Element, class: &str) -> bool {
		element
			.downcast_ref::<MockNode>()
			.is_some_and(|node| node.has_class(class))
	}

	/// An inline style property of `element`
	pub fn style(&self, element: &Element, property: &str) -> Option<String> {
		element
			.downcast_ref::<MockNode>()
			.and_then(|node| node.style(property))
	}

	/// Dispatch a `keydown` from the focused element up to the window.
	///
	/// A `Tab` that no listener prevented moves focus like a browser would,
	/// leaving the document past either end.
	pub fn press_key(&self, key: &str, shift_key: bool) -> Event {
		let event = Event::key_down(key, shift_key);
		if let Some(focused) = self.focused() {
			self.dispatch_element(&focused, &event);
		}
		self.document.dispatch(&event);
		self.window.dispatch(&event);

		if key == "Tab" && !event.default_prevented() {
			let order = self.html.focusable_descendants();
			let position = self
				.focused()
				.and_then(|focused| order.iter().position(|element| *element == focused));
			let next = match (position, shift_key) {
				(None, false) => order.first().cloned(),
				(None, true) => order.last().cloned(),
				(Some(index), false) => order.get(index + 1).cloned(),
				(Some(index), true) => index.checked_sub(1).and_then(|index| order.get(index).cloned()),
			};
			match next {
				Some(element) => element.focus(),
				None => self.blur(),
			}
		}

		self.flush();
		event
	}

	// ------------------------------------------------------------------
	// Events
	// ------------------------------------------------------------------

	/// The window event target
	pub fn window(&self) -> Rc<MockEventTarget> {
		Rc::clone(&self.window)
	}

	/// The document event target
	pub fn document(&self) -> Rc<MockEventTarget> {
		Rc::clone(&self.document)
	}

	/// The event target of `element`
	pub fn element_target(&self, element: &Element) -> Rc<MockEventTarget> {
		Rc::clone(
			self.element_targets
				.borrow_mut()
				.entry(node_id(element))
				.or_default(),
		)
	}

	/// The event target of a media query list
	pub fn media_target(&self, query: &str) -> Rc<MockEventTarget> {
		Rc::clone(
			self.media_targets
				.borrow_mut()
				.entry(query.to_string())
				.or_default(),
		)
	}

	/// Dispatch on the window and flush
	pub fn dispatch_window(&self, event: &Event) {
		self.window.dispatch(event);
		self.flush();
	}

	/// Dispatch on the document and flush
	pub fn dispatch_document(&self, event: &Event) {
		self.document.dispatch(event);
		self.flush();
	}

	/// Dispatch on an element (no bubbling) and flush
	pub fn dispatch_element(&self, element: &Element, event: &Event) {
		let target = self.element_targets.borrow().get(&node_id(element)).cloned();
		if let Some(target) = target {
			target.dispatch(event);
		}
		self.flush();
	}

	/// Set a media query result and dispatch `change` if it differs
	pub fn set_media_query(&self, query: &str, matches: bool) {
		let previous = self.media.borrow_mut().insert(query.to_string(), matches);
		if previous == Some(matches) {
			return;
		}
		let target = self.media_targets.borrow().get(query).cloned();
		if let Some(target) = target {
			target.dispatch(&Event::new("change").with_matches(matches));
		}
		self.flush();
	}

	/// Change `document.hidden` and dispatch `visibilitychange`
	pub fn set_document_hidden(&self, hidden: bool) {
		self.hidden.set(hidden);
		self.dispatch_document(&Event::new("visibilitychange"));
	}

	/// Change `navigator.onLine` and dispatch `online` or `offline`
	pub fn set_online(&self, online: bool) {
		self.online.set(online);
		self.dispatch_window(&Event::new(if online { "online" } else { "offline" }));
	}

	// ------------------------------------------------------------------
	// Intersection observers
	// ------------------------------------------------------------------

	/// Every observer created so far, oldest first
	pub fn observers(&self) -> Vec<Rc<MockIntersectionObserver>> {
		self.observers.borrow().clone()
	}

	/// The most recently created observer
	pub fn latest_observer(&self) -> Option<Rc<MockIntersectionObserver>> {
		self.observers.borrow().last().cloned()
	}

	/// Observers not yet disconnected
	pub fn live_observers(&self) -> usize {
		self.observers
			.borrow()
			.iter()
			.filter(|observer| !observer.is_disconnected())
			.count()
	}

	/// Deliver one entry for `target` to every observer watching it
	pub fn intersect(&self, target: &Element, is_intersecting: bool) {
		let entry = IntersectionEntry {
			is_intersecting,
			intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
			time: self.now.get().as_secs_f64() * 1000.0,
			target: target.clone(),
		};
		let watching: Vec<_> = self
			.observers
			.borrow()
			.iter()
			.filter(|observer| observer.is_observing(target))
			.cloned()
			.collect();
		for observer in watching {
			observer.trigger(vec![entry.clone()]);
		}
		self.flush();
	}

	// ------------------------------------------------------------------
	// Storage, wake lock and capabilities
	// ------------------------------------------------------------------

	/// The `localStorage` area
	pub fn local_storage(&self) -> Rc<MockStorage> {
		Rc::clone(&self.local)
	}

	/// The `sessionStorage` area
	pub fn session_storage(&self) -> Rc<MockStorage> {
		Rc::clone(&self.session)
	}

	/// The wake lock API
	pub fn wake_lock_api(&self) -> Rc<MockWakeLock> {
		Rc::clone(&self.wake_lock)
	}

	/// Pretend to be a server render
	pub fn set_client(&self, client: bool) {
		self.capabilities.client.set(client);
	}

	/// Toggle `matchMedia` support
	pub fn set_match_media_supported(&self, supported: bool) {
		self.capabilities.match_media.set(supported);
	}

	/// Toggle `IntersectionObserver` support
	pub fn set_intersection_observer_supported(&self, supported: bool) {
		self.capabilities.intersection_observer.set(supported);
	}

	/// Toggle storage availability
	pub fn set_storage_available(&self, available: bool) {
		self.capabilities.storage.set(available);
	}

	/// Toggle `navigator.wakeLock` support
	pub fn set_wake_lock_supported(&self, supported: bool) {
		self.capabilities.wake_lock.set(supported);
	}

	/// Width reported for the vertical scrollbar
	pub fn set_scrollbar_width(&self, width: f64) {
		self.scrollbar_width.set(width);
	}
}

impl Default for MockPlatform {
	fn default() -> Self {
		Self::new()
	}
}

impl Platform for MockPlatform {
	fn is_client(&self) -> bool {
		self.capabilities.client.get()
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
		self.count_timer_call(|calls| calls.set_timeout += 1);
		let id = self.next_timer.get();
		self.next_timer.set(id + 1);
		self.timers.borrow_mut().insert(
			id,
			MockTimer {
				due: self.now.get() + delay,
				task: TimerTask::Timeout(callback),
			},
		);
		TimerId::new(id)
	}

	fn clear_timeout(&self, id: TimerId) {
		self.count_timer_call(|calls| calls.clear_timeout += 1);
		self.timers.borrow_mut().remove(&id.raw());
	}

	fn set_interval(&self, delay: Duration, callback: Rc<dyn Fn()>) -> TimerId {
		self.count_timer_call(|calls| calls.set_interval += 1);
		let id = self.next_timer.get();
		self.next_timer.set(id + 1);
		let period = delay.max(Duration::from_millis(1));
		self.timers.borrow_mut().insert(
			id,
			MockTimer {
				due: self.now.get() + period,
				task: TimerTask::Interval { callback, period },
			},
		);
		TimerId::new(id)
	}

	fn clear_interval(&self, id: TimerId) {
		self.count_timer_call(|calls| calls.clear_interval += 1);
		self.timers.borrow_mut().remove(&id.raw());
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		if let Err(error) = self.spawner.spawn_local(task) {
			tracing::error!(%error, "mock platform failed to spawn task");
		}
	}

	fn event_target(&self, source: EventSource<'_>) -> Option<Rc<dyn EventTarget>> {
		let target: Rc<MockEventTarget> = match source {
			EventSource::Window => self.window(),
			EventSource::Document => self.document(),
			EventSource::Element(element) => {
				element.downcast_ref::<MockNode>()?;
				self.element_target(element)
			}
			EventSource::MediaQuery(query) => {
				if !self.capabilities.match_media.get() {
					return None;
				}
				self.media_target(query)
			}
		};
		Some(target)
	}

	fn match_media(&self, query: &str) -> Option<bool> {
		if !self.capabilities.match_media.get() {
			return None;
		}
		Some(self.media.borrow().get(query).copied().unwrap_or(false))
	}

	fn create_intersection_observer(
		&self,
		callback: IntersectionCallback,
		init: ObserverInit,
	) -> Result<Rc<dyn IntersectionObserver>, PlatformError> {
		if !self.capabilities.intersection_observer.get() {
			return Err(PlatformError::Unsupported("IntersectionObserver"));
		}
		init.validate()?;
		if let Some(root) = &init.root {
			let foreign = root
				.downcast_ref::<MockNode>()
				.is_none_or(|node| !node.belongs_to(&self.tree));
			if foreign {
				return Err(PlatformError::invalid_option("root", "element is not in this document"));
			}
		}

		let observer = Rc::new(MockIntersectionObserver::new(callback, init));
		self.observers.borrow_mut().push(Rc::clone(&observer));
		Ok(observer)
	}

	fn active_element(&self) -> Option<Element> {
		self.focused()
	}

	fn document_element(&self) -> Option<Element> {
		Some(self.html())
	}

	fn query_selector_all(&self, selector: &str) -> Vec<Element> {
		self.tree.select(node_id(&self.html), selector)
	}

	fn storage(&self, kind: StorageKind) -> Option<Rc<dyn Storage>> {
		if !self.capabilities.storage.get() {
			return None;
		}
		let area: Rc<dyn Storage> = match kind {
			StorageKind::Local => self.local_storage(),
			StorageKind::Session => self.session_storage(),
		};
		Some(area)
	}

	fn document_hidden(&self) -> bool {
		self.hidden.get()
	}

	fn is_online(&self) -> bool {
		self.online.get()
	}

	fn wake_lock(&self) -> Option<Rc<dyn WakeLockApi>> {
		if !self.capabilities.wake_lock.get() {
			return None;
		}
		Some(self.wake_lock_api())
	}

	fn scrollbar_width(&self) -> f64 {
		self.scrollbar_width.get()
	}
}

/// Index of a mock element; foreign elements map to an index no node has
fn node_id(element: &Element) -> usize {
	element
		.downcast_ref::<MockNode>()
		.map_or(usize::MAX, MockNode::id)
}
