//! Viewport intersection tracking: use_in_view
//!
//! One intersection observer is alive per hook instance. It is rebuilt
//! whenever the options, the target or the enabled flag change, and the
//! previous one is always disconnected first.

use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;

use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use reinhardt_reactive::{Cleanup, Effect, Signal};
use serde::{Deserialize, Serialize};

use crate::liveness::{Liveness, LivenessToken};
use crate::platform::{
	self, Element, IntersectionCallback, IntersectionEntry, IntersectionObserver, NodeRef, ObserverInit,
	Platform,
};

/// How much of the target must be visible to count as in view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Amount {
	/// Fully visible (`1.0`)
	All,
	/// Half visible (`0.5`)
	Some,
	/// A single ratio
	Ratio(f64),
	/// Several ratios, each triggering a tick
	Ratios(Vec<f64>),
}

impl Amount {
	/// Observer thresholds for this amount
	pub fn thresholds(&self) -> Vec<f64> {
		match self {
			Self::All => vec![1.0],
			Self::Some => vec![0.5],
			Self::Ratio(ratio) => vec![*ratio],
			Self::Ratios(ratios) => ratios.clone(),
		}
	}
}

impl From<f64> for Amount {
	fn from(ratio: f64) -> Self {
		Self::Ratio(ratio)
	}
}

impl From<Vec<f64>> for Amount {
	fn from(ratios: Vec<f64>) -> Self {
		Self::Ratios(ratios)
	}
}

/// Argument of the transition callbacks
#[derive(Clone)]
pub struct InViewEvent {
	pub entry: IntersectionEntry,
	pub observer: Rc<dyn IntersectionObserver>,
	pub is_entering: bool,
	pub is_exiting: bool,
}

impl fmt::Debug for InViewEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InViewEvent")
			.field("entry", &self.entry)
			.field("is_entering", &self.is_entering)
			.field("is_exiting", &self.is_exiting)
			.finish_non_exhaustive()
	}
}

/// Transition callback. It is awaited before the state is written; an
/// error cancels the write for that tick.
pub type InViewCallback = Rc<dyn Fn(InViewEvent) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

fn boxed_callback<F, Fut>(callback: F) -> InViewCallback
where
	F: Fn(InViewEvent) -> Fut + 'static,
	Fut: Future<Output = anyhow::Result<()>> + 'static,
{
	Rc::new(move |event| Box::pin(callback(event)))
}

/// Options of [`use_in_view`]
#[derive(Clone)]
pub struct InViewOptions {
	/// Scroll container; `None` is the document viewport
	pub root: Option<Element>,
	/// CSS margin around the root, e.g. `"10px 0px"`
	pub margin: Option<String>,
	pub amount: Option<Amount>,
	/// Stop observing after the first time the target enters
	pub once: bool,
	/// Value reported before the first observation
	pub initial: bool,
	/// Initial observation toggle, see [`InView::set_enabled`]
	pub enable: bool,
	pub on_enter: Option<InViewCallback>,
	pub on_exit: Option<InViewCallback>,
	/// Called on every transition after `on_enter` / `on_exit`
	pub on_intersect: Option<InViewCallback>,
}

impl Default for InViewOptions {
	fn default() -> Self {
		Self {
			root: None,
			margin: None,
			amount: None,
			once: false,
			initial: false,
			enable: true,
			on_enter: None,
			on_exit: None,
			on_intersect: None,
		}
	}
}

impl InViewOptions {
	pub fn root(mut self, root: Element) -> Self {
		self.root = Some(root);
		self
	}

	pub fn margin(mut self, margin: impl Into<String>) -> Self {
		self.margin = Some(margin.into());
		self
	}

	pub fn amount(mut self, amount: impl Into<Amount>) -> Self {
		self.amount = Some(amount.into());
		self
	}

	pub fn once(mut self, once: bool) -> Self {
		self.once = once;
		self
	}

	pub fn initial(mut self, initial: bool) -> Self {
		self.initial = initial;
		self
	}

	pub fn enable(mut self, enable: bool) -> Self {
		self.enable = enable;
		self
	}

	pub fn on_enter<F, Fut>(mut self, on_enter: F) -> Self
	where
		F: Fn(InViewEvent) -> Fut + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		self.on_enter = Some(boxed_callback(on_enter));
		self
	}

	pub fn on_exit<F, Fut>(mut self, on_exit: F) -> Self
	where
		F: Fn(InViewEvent) -> Fut + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		self.on_exit = Some(boxed_callback(on_exit));
		self
	}

	pub fn on_intersect<F, Fut>(mut self, on_intersect: F) -> Self
	where
		F: Fn(InViewEvent) -> Fut + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		self.on_intersect = Some(boxed_callback(on_intersect));
		self
	}

	fn observer_init(&self) -> ObserverInit {
		ObserverInit {
			root: self.root.clone(),
			root_margin: self.margin.clone(),
			thresholds: self.amount.as_ref().map(Amount::thresholds).unwrap_or_default(),
		}
	}
}

impl fmt::Debug for InViewOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InViewOptions")
			.field("root", &self.root)
			.field("margin", &self.margin)
			.field("amount", &self.amount)
			.field("once", &self.once)
			.field("initial", &self.initial)
			.field("enable", &self.enable)
			.field("on_enter", &self.on_enter.is_some())
			.field("on_exit", &self.on_exit.is_some())
			.field("on_intersect", &self.on_intersect.is_some())
			.finish()
	}
}

struct ViewState {
	in_view: Signal<bool>,
	enabled: Signal<bool>,
	/// `None` until the first real entry arrives
	was_in_view: Cell<Option<bool>>,
	observer: RefCell<Option<Rc<dyn IntersectionObserver>>>,
	liveness: Liveness,
}

/// Callbacks and flags one observer generation works with
struct Tick {
	state: Weak<ViewState>,
	token: LivenessToken,
	platform: Rc<dyn Platform>,
	once: bool,
	/// Set when `once` already disconnected the observer
	finished: Rc<Cell<bool>>,
	on_enter: Option<InViewCallback>,
	on_exit: Option<InViewCallback>,
	on_intersect: Option<InViewCallback>,
}

impl Tick {
	fn handle(&self, entries: Vec<IntersectionEntry>) {
		let Some(entry) = entries.into_iter().next() else {
			return;
		};
		let Some(state) = self.state.upgrade() else {
			return;
		};
		if !self.token.is_alive() {
			return;
		}
		let Some(observer) = state.observer.borrow().clone() else {
			return;
		};

		let is_in_view = entry.is_intersecting;
		let is_exiting = !is_in_view && state.was_in_view.get() == Some(true);
		state.was_in_view.set(Some(is_in_view));

		let event = InViewEvent {
			entry,
			observer: Rc::clone(&observer),
			is_entering: is_in_view,
			is_exiting,
		};
		let on_enter = self.on_enter.clone().filter(|_| event.is_entering);
		let on_exit = self.on_exit.clone().filter(|_| event.is_exiting);
		let on_intersect = self
			.on_intersect
			.clone()
			.filter(|_| event.is_entering || event.is_exiting);

		let state = Rc::downgrade(&state);
		let token = self.token.clone();
		let once = self.once;
		let finished = Rc::clone(&self.finished);

		self.platform.spawn_local(Box::pin(async move {
			let mut failed = false;
			for callback in [on_enter, on_exit, on_intersect].into_iter().flatten() {
				if let Err(error) = callback(event.clone()).await {
					tracing::error!(error = %error, "in-view callback failed, state left unchanged");
					failed = true;
					break;
				}
			}

			if !failed {
				if let Some(state) = state.upgrade().filter(|_| token.is_alive()) {
					state.in_view.set_if_changed(is_in_view);
				}
			}

			// A failed tick still counts as the one `once` waits for
			if once && is_in_view && !finished.replace(true) {
				observer.disconnect();
			}
		}));
	}
}

/// Handle returned by [`use_in_view`]
pub struct InView {
	effect: Effect,
	state: Rc<ViewState>,
}

impl InView {
	/// Whether the target is in view (tracked)
	pub fn in_view(&self) -> bool {
		self.state.in_view.get()
	}

	/// The in-view state cell
	pub fn in_view_signal(&self) -> Signal<bool> {
		self.state.in_view.clone()
	}

	/// Whether observation is enabled (tracked)
	pub fn enabled(&self) -> bool {
		self.state.enabled.get()
	}

	/// Override the in-view state
	pub fn set_in_view(&self, in_view: bool) {
		self.state.in_view.set_if_changed(in_view);
	}

	/// Toggle observation; the observer is rebuilt on the next flush
	pub fn set_enabled(&self, enabled: bool) {
		self.state.enabled.set_if_changed(enabled);
	}

	/// The live observer, if any
	pub fn observer(&self) -> Option<Rc<dyn IntersectionObserver>> {
		self.state.observer.borrow().clone()
	}

	/// Disconnect and stop reacting
	pub fn dispose(&self) {
		self.effect.dispose();
	}
}

/// Tracks whether `target` intersects the viewport (or `options.root`).
///
/// Transition callbacks run in the order `on_enter`, `on_exit`,
/// `on_intersect` and are all awaited before the state is written. A failing
/// callback is logged and the state keeps its previous value for that tick.
/// The first entry ever delivered can enter but never exit.
///
/// Without intersection observer support the state stays at
/// `options.initial`; manual overrides keep working. Invalid options are
/// logged and leave the hook without an observer.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::dom_api::{use_in_view, Amount, InViewOptions};
/// use reinhardt_hooks::platform::NodeRef;
///
/// let section = NodeRef::new();
/// let in_view = use_in_view(
///     section.clone(),
///     InViewOptions::default()
///         .amount(Amount::Some)
///         .once(true)
///         .on_enter(|event| async move {
///             tracing::info!(ratio = event.entry.intersection_ratio, "section revealed");
///             Ok(())
///         }),
/// );
///
/// if in_view.in_view() {
///     // ...
/// }
/// ```
pub fn use_in_view(target: NodeRef, options: impl Into<Signal<InViewOptions>>) -> InView {
	let platform = platform::current();
	let options = options.into();
	let (initial, enable) = options.with_untracked(|options| (options.initial, options.enable));

	let state = Rc::new(ViewState {
		in_view: Signal::new(initial),
		enabled: Signal::new(enable),
		was_in_view: Cell::new(None),
		observer: RefCell::new(None),
		liveness: Liveness::new(),
	});

	let effect = Effect::with_cleanup({
		let state = Rc::downgrade(&state);
		move || {
			let Some(view) = state.upgrade() else {
				return Cleanup::none();
			};
			let options = options.get();
			let enabled = view.enabled.get();
			let target = target.get();

			let Some(target) = target.filter(|_| enabled) else {
				return Cleanup::none();
			};

			let tick = Tick {
				state: Weak::clone(&state),
				token: view.liveness.token(),
				platform: Rc::clone(&platform),
				once: options.once,
				finished: Rc::new(Cell::new(false)),
				on_enter: options.on_enter.clone(),
				on_exit: options.on_exit.clone(),
				on_intersect: options.on_intersect.clone(),
			};
			let finished = Rc::clone(&tick.finished);
			let callback: IntersectionCallback = Rc::new(move |entries: Vec<IntersectionEntry>| tick.handle(entries));

			let observer = match platform.create_intersection_observer(callback, options.observer_init()) {
				Ok(observer) => observer,
				Err(error) if error.is_unsupported() => {
					tracing::debug!("intersection observer unavailable, in-view state stays at its initial value");
					return Cleanup::none();
				}
				Err(error) => {
					tracing::error!(error = %error, "failed to create intersection observer");
					return Cleanup::none();
				}
			};

			observer.observe(&target);
			*view.observer.borrow_mut() = Some(Rc::clone(&observer));

			let state = Weak::clone(&state);
			Cleanup::new(move || {
				if let Some(view) = state.upgrade() {
					view.liveness.invalidate();
					view.observer.borrow_mut().take();
				}
				if !finished.replace(true) {
					observer.disconnect();
				}
			})
		}
	});

	InView { effect, state }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use futures::channel::oneshot;
	use rstest::rstest;
	use serial_test::serial;

	type Log = Rc<RefCell<Vec<String>>>;

	fn recorder(
		log: &Log,
		name: &'static str,
	) -> impl Fn(InViewEvent) -> LocalBoxFuture<'static, anyhow::Result<()>> + use<> {
		let log = Rc::clone(log);
		move |event| {
			log.borrow_mut()
				.push(format!("{name} entering={} exiting={}", event.is_entering, event.is_exiting));
			Box::pin(async { Ok(()) })
		}
	}

	fn mounted_target(mock: &MockPlatform) -> (Element, NodeRef) {
		let element = mock.append(&mock.body(), "section", &[]);
		(element.clone(), NodeRef::with_element(element))
	}

	#[rstest]
	#[case(Amount::All, vec![1.0])]
	#[case(Amount::Some, vec![0.5])]
	#[case(Amount::Ratio(0.25), vec![0.25])]
	#[case(Amount::Ratios(vec![0.0, 0.5, 1.0]), vec![0.0, 0.5, 1.0])]
	fn test_amount_thresholds(#[case] amount: Amount, #[case] expected: Vec<f64>) {
		assert_eq!(amount.thresholds(), expected);
	}

	#[test]
	#[serial]
	fn test_observer_receives_options() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let root = mock.append(&mock.body(), "div", &[]);

		let _in_view = use_in_view(
			target,
			InViewOptions::default()
				.root(root.clone())
				.margin("10px 0px")
				.amount(Amount::All),
		);

		let observer = mock.latest_observer().unwrap();
		assert_eq!(observer.init().root.as_ref(), Some(&root));
		assert_eq!(observer.init().root_margin.as_deref(), Some("10px 0px"));
		assert_eq!(observer.init().thresholds, vec![1.0]);
		assert!(observer.is_observing(&element));
	}

	#[test]
	#[serial]
	fn test_first_entry_enters_without_exit() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let log: Log = Rc::default();

		let in_view = use_in_view(
			target,
			InViewOptions::default()
				.on_enter(recorder(&log, "enter"))
				.on_exit(recorder(&log, "exit"))
				.on_intersect(recorder(&log, "intersect")),
		);
		assert!(!in_view.in_view());

		mock.intersect(&element, true);
		assert!(in_view.in_view());
		assert_eq!(
			*log.borrow(),
			vec!["enter entering=true exiting=false", "intersect entering=true exiting=false"]
		);
	}

	#[test]
	#[serial]
	fn test_synthetic_negative_first_tick_is_silent() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let log: Log = Rc::default();

		let in_view = use_in_view(
			target,
			InViewOptions::default()
				.initial(true)
				.on_exit(recorder(&log, "exit"))
				.on_intersect(recorder(&log, "intersect")),
		);

		mock.intersect(&element, false);
		assert!(!in_view.in_view());
		assert!(log.borrow().is_empty());
	}

	#[test]
	#[serial]
	fn test_exit_after_enter() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let log: Log = Rc::default();

		let in_view = use_in_view(
			target,
			InViewOptions::default()
				.on_enter(recorder(&log, "enter"))
				.on_exit(recorder(&log, "exit"))
				.on_intersect(recorder(&log, "intersect")),
		);

		mock.intersect(&element, true);
		log.borrow_mut().clear();
		mock.intersect(&element, false);

		assert!(!in_view.in_view());
		assert_eq!(
			*log.borrow(),
			vec!["exit entering=false exiting=true", "intersect entering=false exiting=true"]
		);
	}

	#[test]
	#[serial]
	fn test_failing_callback_skips_write() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let intersected = Rc::new(Cell::new(false));

		let in_view = use_in_view(
			target,
			InViewOptions::default()
				.on_enter(|_| async { Err(anyhow::anyhow!("analytics offline")) })
				.on_intersect({
					let intersected = Rc::clone(&intersected);
					move |_| {
						intersected.set(true);
						async { Ok(()) }
					}
				}),
		);

		mock.intersect(&element, true);
		assert!(!in_view.in_view());
		assert!(!intersected.get());
		assert!(!mock.latest_observer().unwrap().is_disconnected());
	}

	#[test]
	#[serial]
	fn test_once_disconnects_after_entering() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);

		let in_view = use_in_view(target, InViewOptions::default().once(true));
		let observer = mock.latest_observer().unwrap();

		mock.intersect(&element, false);
		assert!(!observer.is_disconnected());

		mock.intersect(&element, true);
		assert!(in_view.in_view());
		assert_eq!(observer.disconnect_calls(), 1);

		drop(in_view);
		assert_eq!(observer.disconnect_calls(), 1);
	}

	#[test]
	#[serial]
	fn test_once_disconnects_when_enter_callback_fails() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);

		let in_view = use_in_view(
			target,
			InViewOptions::default()
				.once(true)
				.on_enter(|_| async { Err(anyhow::anyhow!("tracking pixel failed")) }),
		);
		let observer = mock.latest_observer().unwrap();

		mock.intersect(&element, true);
		assert!(!in_view.in_view());
		assert!(observer.is_disconnected());
		assert_eq!(observer.disconnect_calls(), 1);

		drop(in_view);
		assert_eq!(observer.disconnect_calls(), 1);
	}

	#[test]
	#[serial]
	fn test_unsupported_degrades_to_initial() {
		let mock = MockPlatform::install();
		mock.set_intersection_observer_supported(false);
		let (_, target) = mounted_target(&mock);

		let in_view = use_in_view(target, InViewOptions::default().initial(true));
		assert!(in_view.in_view());
		assert!(in_view.enabled());
		assert!(in_view.observer().is_none());

		in_view.set_in_view(false);
		in_view.set_enabled(false);
		mock.flush();
		assert!(!in_view.in_view());
		assert!(!in_view.enabled());
	}

	#[rstest]
	#[case::bad_margin(InViewOptions::default().margin("ten pixels"))]
	#[case::bad_threshold(InViewOptions::default().amount(1.5))]
	#[serial]
	fn test_invalid_options_leave_no_observer(#[case] options: InViewOptions) {
		let mock = MockPlatform::install();
		let (_, target) = mounted_target(&mock);

		let in_view = use_in_view(target, options);
		assert!(in_view.observer().is_none());
		assert!(mock.observers().is_empty());
		assert!(!in_view.in_view());
	}

	#[test]
	#[serial]
	fn test_foreign_root_is_rejected() {
		let mock = MockPlatform::install();
		let (_, target) = mounted_target(&mock);
		let other = MockPlatform::new();
		let foreign = other.append(&other.body(), "div", &[]);

		let in_view = use_in_view(target, InViewOptions::default().root(foreign));
		assert!(in_view.observer().is_none());
	}

	#[test]
	#[serial]
	fn test_enable_toggle_recreates_observer() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);

		let in_view = use_in_view(target, InViewOptions::default());
		assert_eq!(mock.live_observers(), 1);

		in_view.set_enabled(false);
		mock.flush();
		assert_eq!(mock.live_observers(), 0);
		assert!(in_view.observer().is_none());

		in_view.set_enabled(true);
		mock.flush();
		assert_eq!(mock.observers().len(), 2);
		assert_eq!(mock.live_observers(), 1);
		assert!(mock.latest_observer().unwrap().is_observing(&element));
	}

	#[test]
	#[serial]
	fn test_disabled_at_start_creates_nothing() {
		let mock = MockPlatform::install();
		let (_, target) = mounted_target(&mock);

		let in_view = use_in_view(target, InViewOptions::default().enable(false));
		assert!(!in_view.enabled());
		assert!(mock.observers().is_empty());
	}

	#[test]
	#[serial]
	fn test_target_binding_follows_ref() {
		let mock = MockPlatform::install();
		let target = NodeRef::new();

		let _in_view = use_in_view(target.clone(), InViewOptions::default());
		assert!(mock.observers().is_empty());

		let element = mock.append(&mock.body(), "img", &[]);
		target.set(Some(element.clone()));
		mock.flush();
		assert!(mock.latest_observer().unwrap().is_observing(&element));

		target.set(None);
		mock.flush();
		assert_eq!(mock.live_observers(), 0);
	}

	#[test]
	#[serial]
	fn test_reconfiguration_replaces_observer() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let options = Signal::new(InViewOptions::default());

		let in_view = use_in_view(target, options.clone());
		let first = mock.latest_observer().unwrap();

		options.set(InViewOptions::default().amount(Amount::Some));
		mock.flush();
		assert!(first.is_disconnected());
		assert_eq!(mock.live_observers(), 1);
		assert_eq!(mock.latest_observer().unwrap().init().thresholds, vec![0.5]);

		mock.intersect(&element, true);
		assert!(in_view.in_view());
	}

	#[test]
	#[serial]
	fn test_stale_tick_is_dropped_after_teardown() {
		let mock = MockPlatform::install();
		let (element, target) = mounted_target(&mock);
		let (sender, receiver) = oneshot::channel::<()>();
		let receiver = Rc::new(RefCell::new(Some(receiver)));

		let in_view = use_in_view(
			target,
			InViewOptions::default().on_enter(move |_| {
				let receiver = receiver.borrow_mut().take();
				async move {
					if let Some(receiver) = receiver {
						receiver.await?;
					}
					Ok(())
				}
			}),
		);
		let state = in_view.in_view_signal();

		mock.intersect(&element, true);
		assert!(!state.get_untracked());

		drop(in_view);
		sender.send(()).unwrap();
		mock.flush();
		assert!(!state.get_untracked());
	}

	#[test]
	#[serial]
	fn test_empty_batches_are_ignored() {
		let mock = MockPlatform::install();
		let (_, target) = mounted_target(&mock);

		let in_view = use_in_view(target, InViewOptions::default().initial(true));
		mock.latest_observer().unwrap().trigger(Vec::new());
		mock.flush();
		assert!(in_view.in_view());
	}
}
