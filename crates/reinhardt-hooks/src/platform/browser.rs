//! Browser platform built on `web-sys`.

use core::any::Any;
use core::cell::{Cell, RefCell};
use core::time::Duration;

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{
	DomNode, Element, Event, EventSource, EventTarget, FOCUSABLE_SELECTOR, IntersectionCallback,
	IntersectionEntry, IntersectionObserver, Listener, ListenerOptions, ObserverInit, Platform,
	Storage, StorageKind, TimerId, WakeLockApi, WakeLockSentinel,
};
use crate::error::PlatformError;

type TimerClosures = Rc<RefCell<BTreeMap<i32, Closure<dyn FnMut()>>>>;

/// [`Platform`] backed by the page's `window` and `document`
pub struct BrowserPlatform {
	window: web_sys::Window,
	document: web_sys::Document,
	timeouts: TimerClosures,
	intervals: TimerClosures,
}

impl BrowserPlatform {
	/// Bind to the global window, `None` outside a window context (e.g. workers)
	pub fn new() -> Option<Self> {
		let window = web_sys::window()?;
		let document = window.document()?;
		Some(Self {
			window,
			document,
			timeouts: Rc::default(),
			intervals: Rc::default(),
		})
	}

	/// Flush passive effects on a microtask after each batch of signal writes
	pub fn install_scheduler(&self) {
		reinhardt_reactive::set_scheduler(|task| {
			wasm_bindgen_futures::spawn_local(async move { task() });
		});
	}
}

fn delay_millis(delay: Duration) -> i32 {
	i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

/// Best-effort `name: message` rendering of a thrown JS value
fn js_error_message(error: &JsValue) -> String {
	if let Some(text) = error.as_string() {
		return text;
	}
	let field = |name: &str| {
		Reflect::get(error, &JsValue::from_str(name))
			.ok()
			.and_then(|value| value.as_string())
	};
	match (field("name"), field("message")) {
		(Some(name), Some(message)) => format!("{name}: {message}"),
		(None, Some(message)) => message,
		_ => format!("{error:?}"),
	}
}

fn rejected(error: &JsValue) -> PlatformError {
	let field = |name: &str| {
		Reflect::get(error, &JsValue::from_str(name))
			.ok()
			.and_then(|value| value.as_string())
	};
	PlatformError::Rejected {
		name: field("name").unwrap_or_else(|| "Error".to_string()),
		message: field("message").unwrap_or_else(|| js_error_message(error)),
	}
}

impl Platform for BrowserPlatform {
	fn is_client(&self) -> bool {
		true
	}

	fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
		let assigned = Rc::new(Cell::new(None::<i32>));
		let mut callback = Some(callback);
		let closure = Closure::<dyn FnMut()>::new({
			let timeouts = Rc::clone(&self.timeouts);
			let assigned = Rc::clone(&assigned);
			move || {
				// Keep our own closure alive until this call returns
				let _this = assigned.get().and_then(|id| timeouts.borrow_mut().remove(&id));
				if let Some(callback) = callback.take() {
					callback();
				}
			}
		});

		match self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				delay_millis(delay),
			) {
			Ok(id) => {
				assigned.set(Some(id));
				self.timeouts.borrow_mut().insert(id, closure);
				TimerId::new(i64::from(id))
			}
			Err(err) => {
				tracing::error!(error = %js_error_message(&err), "setTimeout failed");
				TimerId::new(-1)
			}
		}
	}

	fn clear_timeout(&self, id: TimerId) {
		let Ok(raw) = i32::try_from(id.raw()) else {
			return;
		};
		self.window.clear_timeout_with_handle(raw);
		let closure = self.timeouts.borrow_mut().remove(&raw);
		drop(closure);
	}

	fn set_interval(&self, delay: Duration, callback: Rc<dyn Fn()>) -> TimerId {
		let closure = Closure::<dyn FnMut()>::new(move || callback());

		match self
			.window
			.set_interval_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				delay_millis(delay),
			) {
			Ok(id) => {
				self.intervals.borrow_mut().insert(id, closure);
				TimerId::new(i64::from(id))
			}
			Err(err) => {
				tracing::error!(error = %js_error_message(&err), "setInterval failed");
				TimerId::new(-1)
			}
		}
	}

	fn clear_interval(&self, id: TimerId) {
		let Ok(raw) = i32::try_from(id.raw()) else {
			return;
		};
		self.window.clear_interval_with_handle(raw);
		let closure = self.intervals.borrow_mut().remove(&raw);
		drop(closure);
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}

	fn event_target(&self, source: EventSource<'_>) -> Option<Rc<dyn EventTarget>> {
		let target: web_sys::EventTarget = match source {
			EventSource::Window => self.window.clone().into(),
			EventSource::Document => self.document.clone().into(),
			EventSource::Element(element) => web_element(element)?.0.clone().into(),
			EventSource::MediaQuery(query) => match self.window.match_media(query) {
				Ok(Some(list)) => list.into(),
				Ok(None) => return None,
				Err(err) => {
					tracing::debug!(query, error = %js_error_message(&err), "matchMedia unavailable");
					return None;
				}
			},
		};
		Some(Rc::new(WebEventTarget::new(target)))
	}

	fn match_media(&self, query: &str) -> Option<bool> {
		match self.window.match_media(query) {
			Ok(list) => list.map(|list| list.matches()),
			Err(err) => {
				tracing::debug!(query, error = %js_error_message(&err), "matchMedia unavailable");
				None
			}
		}
	}

	fn create_intersection_observer(
		&self,
		callback: IntersectionCallback,
		init: ObserverInit,
	) -> Result<Rc<dyn IntersectionObserver>, PlatformError> {
		let constructor = Reflect::get(&self.window, &JsValue::from_str("IntersectionObserver"))
			.map_err(|err| PlatformError::Js(js_error_message(&err)))?;
		if constructor.is_undefined() {
			return Err(PlatformError::Unsupported("IntersectionObserver"));
		}

		let options = web_sys::IntersectionObserverInit::new();
		let set = |key: &str, value: &JsValue| {
			Reflect::set(&options, &JsValue::from_str(key), value)
				.map(|_| ())
				.map_err(|err| PlatformError::Js(js_error_message(&err)))
		};
		if let Some(root) = &init.root {
			let root = web_element(root)
				.ok_or_else(|| PlatformError::invalid_option("root", "element belongs to another platform"))?;
			set("root", root.0.as_ref())?;
		}
		if let Some(margin) = &init.root_margin {
			set("rootMargin", &JsValue::from_str(margin))?;
		}
		if !init.thresholds.is_empty() {
			let thresholds: Array = init.thresholds.iter().map(|t| JsValue::from_f64(*t)).collect();
			set("threshold", thresholds.as_ref())?;
		}

		let closure = Closure::<dyn FnMut(Array, web_sys::IntersectionObserver)>::new(
			move |entries: Array, _observer: web_sys::IntersectionObserver| {
				let entries = entries
					.iter()
					.filter_map(|entry| entry.dyn_into::<web_sys::IntersectionObserverEntry>().ok())
					.map(|entry| IntersectionEntry {
						is_intersecting: entry.is_intersecting(),
						intersection_ratio: entry.intersection_ratio(),
						time: entry.time(),
						target: Element::new(WebElement(entry.target())),
					})
					.collect();
				callback(entries);
			},
		);

		// Invalid margins and thresholds surface here as a thrown SyntaxError / RangeError
		let observer = web_sys::IntersectionObserver::new_with_options(
			closure.as_ref().unchecked_ref(),
			&options,
		)
		.map_err(|err| PlatformError::invalid_option("IntersectionObserverInit", js_error_message(&err)))?;

		Ok(Rc::new(WebIntersectionObserver {
			observer,
			_callback: closure,
		}))
	}

	fn active_element(&self) -> Option<Element> {
		self.document
			.active_element()
			.map(|element| Element::new(WebElement(element)))
	}

	fn document_element(&self) -> Option<Element> {
		self.document
			.document_element()
			.map(|element| Element::new(WebElement(element)))
	}

	fn query_selector_all(&self, selector: &str) -> Vec<Element> {
		match self.document.query_selector_all(selector) {
			Ok(list) => elements_of(&list),
			Err(err) => {
				tracing::error!(selector, error = %js_error_message(&err), "invalid selector");
				Vec::new()
			}
		}
	}

	fn storage(&self, kind: StorageKind) -> Option<Rc<dyn Storage>> {
		let storage = match kind {
			StorageKind::Local => self.window.local_storage(),
			StorageKind::Session => self.window.session_storage(),
		};
		match storage {
			Ok(Some(storage)) => Some(Rc::new(WebStorage(storage))),
			Ok(None) => None,
			// Access throws a SecurityError when storage is disabled
			Err(err) => {
				tracing::debug!(storage = kind.as_str(), error = %js_error_message(&err), "storage unavailable");
				None
			}
		}
	}

	fn document_hidden(&self) -> bool {
		self.document.hidden()
	}

	fn is_online(&self) -> bool {
		self.window.navigator().on_line()
	}

	fn wake_lock(&self) -> Option<Rc<dyn WakeLockApi>> {
		let api = Reflect::get(&self.window.navigator(), &JsValue::from_str("wakeLock")).ok()?;
		if api.is_undefined() || api.is_null() {
			return None;
		}
		Some(Rc::new(WebWakeLock {
			api,
		}))
	}

	fn scrollbar_width(&self) -> f64 {
		let inner_width = self
			.window
			.inner_width()
			.ok()
			.and_then(|width| width.as_f64())
			.unwrap_or(0.0);
		let client_width = self
			.document
			.document_element()
			.map(|root| f64::from(root.client_width()))
			.unwrap_or(inner_width);
		(inner_width - client_width).max(0.0)
	}
}

fn web_element(element: &Element) -> Option<&WebElement> {
	element.downcast_ref::<WebElement>()
}

fn elements_of(list: &web_sys::NodeList) -> Vec<Element> {
	(0..list.length())
		.filter_map(|index| list.get(index))
		.filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
		.map(|element| Element::new(WebElement(element)))
		.collect()
}

/// A DOM element
pub(crate) struct WebElement(web_sys::Element);

impl DomNode for WebElement {
	fn focus(&self) {
		let Some(element) = self.0.dyn_ref::<web_sys::HtmlElement>() else {
			return;
		};
		if let Err(err) = element.focus() {
			tracing::debug!(error = %js_error_message(&err), "focus() threw");
		}
	}

	fn is_same_node(&self, other: &dyn DomNode) -> bool {
		other
			.as_any()
			.downcast_ref::<WebElement>()
			.is_some_and(|other| self.0.is_same_node(Some(other.0.as_ref())))
	}

	fn focusable_descendants(&self) -> Vec<Element> {
		match self.0.query_selector_all(FOCUSABLE_SELECTOR) {
			Ok(list) => elements_of(&list),
			Err(_) => Vec::new(),
		}
	}

	fn attribute(&self, name: &str) -> Option<String> {
		self.0.get_attribute(name)
	}

	fn set_attribute(&self, name: &str, value: &str) {
		if let Err(err) = self.0.set_attribute(name, value) {
			tracing::error!(name, error = %js_error_message(&err), "setAttribute failed");
		}
	}

	fn toggle_class(&self, class: &str, force: bool) {
		if let Err(err) = self.0.class_list().toggle_with_force(class, force) {
			tracing::error!(class, error = %js_error_message(&err), "classList.toggle failed");
		}
	}

	fn set_style(&self, property: &str, value: &str) {
		let Some(element) = self.0.dyn_ref::<web_sys::HtmlElement>() else {
			return;
		};
		if let Err(err) = element.style().set_property(property, value) {
			tracing::error!(property, error = %js_error_message(&err), "style.setProperty failed");
		}
	}

	fn remove_style(&self, property: &str) {
		if let Some(element) = self.0.dyn_ref::<web_sys::HtmlElement>() {
			let _ = element.style().remove_property(property);
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

struct Binding {
	event_type: String,
	capture: bool,
	listener: Listener,
	closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Any DOM event target, keeping the JS closures it handed out alive
struct WebEventTarget {
	target: web_sys::EventTarget,
	bindings: RefCell<Vec<Binding>>,
}

impl WebEventTarget {
	fn new(target: web_sys::EventTarget) -> Self {
		Self {
			target,
			bindings: RefCell::new(Vec::new()),
		}
	}
}

fn convert_event(raw: web_sys::Event) -> Event {
	let mut event = Event::new(raw.type_());
	if let Some(keyboard) = raw.dyn_ref::<web_sys::KeyboardEvent>() {
		event = event
			.with_key(keyboard.key())
			.with_shift_key(keyboard.shift_key());
	}
	if let Some(change) = raw.dyn_ref::<web_sys::MediaQueryListEvent>() {
		event = event.with_matches(change.matches());
	}
	event.with_raw(raw)
}

impl EventTarget for WebEventTarget {
	fn add_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		let closure = Closure::<dyn FnMut(web_sys::Event)>::new({
			let listener = listener.clone();
			move |raw: web_sys::Event| listener.call(&convert_event(raw))
		});

		let js_options = web_sys::AddEventListenerOptions::new();
		js_options.set_capture(options.capture);
		js_options.set_once(options.once);
		js_options.set_passive(options.passive);

		if let Err(err) = self
			.target
			.add_event_listener_with_callback_and_add_event_listener_options(
				event_type,
				closure.as_ref().unchecked_ref(),
				&js_options,
			) {
			tracing::error!(event_type, error = %js_error_message(&err), "addEventListener failed");
			return;
		}

		self.bindings.borrow_mut().push(Binding {
			event_type: event_type.to_string(),
			capture: options.capture,
			listener: listener.clone(),
			closure,
		});
	}

	fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		let position = self.bindings.borrow().iter().position(|binding| {
			binding.event_type == event_type
				&& binding.capture == options.capture
				&& binding.listener.ptr_eq(listener)
		});
		let Some(position) = position else {
			return;
		};

		let binding = self.bindings.borrow_mut().remove(position);
		let _ = self.target.remove_event_listener_with_callback_and_bool(
			event_type,
			binding.closure.as_ref().unchecked_ref(),
			options.capture,
		);
	}
}

/// `localStorage` or `sessionStorage`
struct WebStorage(web_sys::Storage);

impl Storage for WebStorage {
	fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError> {
		self.0
			.get_item(key)
			.map_err(|err| PlatformError::Storage(js_error_message(&err)))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
		self.0
			.set_item(key, value)
			.map_err(|err| PlatformError::Storage(js_error_message(&err)))
	}

	fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
		self.0
			.remove_item(key)
			.map_err(|err| PlatformError::Storage(js_error_message(&err)))
	}
}

struct WebIntersectionObserver {
	observer: web_sys::IntersectionObserver,
	_callback: Closure<dyn FnMut(Array, web_sys::IntersectionObserver)>,
}

impl IntersectionObserver for WebIntersectionObserver {
	fn observe(&self, target: &Element) {
		match web_element(target) {
			Some(element) => self.observer.observe(&element.0),
			None => tracing::error!("cannot observe an element from another platform"),
		}
	}

	fn unobserve(&self, target: &Element) {
		if let Some(element) = web_element(target) {
			self.observer.unobserve(&element.0);
		}
	}

	fn disconnect(&self) {
		self.observer.disconnect();
	}

	fn thresholds(&self) -> Vec<f64> {
		self.observer
			.thresholds()
			.iter()
			.filter_map(|value| value.as_f64())
			.collect()
	}
}

/// `navigator.wakeLock`, driven through reflection
struct WebWakeLock {
	api: JsValue,
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, PlatformError> {
	let method: Function = Reflect::get(target, &JsValue::from_str(name))
		.map_err(|err| PlatformError::Js(js_error_message(&err)))?
		.dyn_into()
		.map_err(|_| PlatformError::Unsupported("WakeLock"))?;
	method.apply(target, args).map_err(|err| rejected(&err))
}

impl WakeLockApi for WebWakeLock {
	fn request(&self) -> LocalBoxFuture<'static, Result<Rc<dyn WakeLockSentinel>, PlatformError>> {
		let promise = call_method(&self.api, "request", &Array::of1(&JsValue::from_str("screen")));
		Box::pin(async move {
			let promise: Promise = promise?
				.dyn_into()
				.map_err(|_| PlatformError::Js("wakeLock.request() did not return a promise".into()))?;
			let sentinel = JsFuture::from(promise).await.map_err(|err| rejected(&err))?;
			let target: web_sys::EventTarget = sentinel
				.clone()
				.dyn_into()
				.map_err(|_| PlatformError::Js("wake lock sentinel is not an EventTarget".into()))?;
			Ok(Rc::new(WebWakeLockSentinel {
				sentinel,
				events: WebEventTarget::new(target),
			}) as Rc<dyn WakeLockSentinel>)
		})
	}
}

struct WebWakeLockSentinel {
	sentinel: JsValue,
	events: WebEventTarget,
}

impl EventTarget for WebWakeLockSentinel {
	fn add_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.events.add_event_listener(event_type, listener, options);
	}

	fn remove_event_listener(&self, event_type: &str, listener: &Listener, options: ListenerOptions) {
		self.events.remove_event_listener(event_type, listener, options);
	}
}

impl WakeLockSentinel for WebWakeLockSentinel {
	fn released(&self) -> bool {
		Reflect::get(&self.sentinel, &JsValue::from_str("released"))
			.ok()
			.and_then(|value| value.as_bool())
			.unwrap_or(true)
	}

	fn release(&self) -> LocalBoxFuture<'static, Result<(), PlatformError>> {
		let promise = call_method(&self.sentinel, "release", &Array::new());
		Box::pin(async move {
			let promise: Promise = promise?
				.dyn_into()
				.map_err(|_| PlatformError::Js("release() did not return a promise".into()))?;
			JsFuture::from(promise)
				.await
				.map(|_| ())
				.map_err(|err| rejected(&err))
		})
	}
}
