//! Keyboard focus trap: use_focus_trap

use core::cell::RefCell;

use std::rc::Rc;

use reinhardt_reactive::{Cleanup, Effect, Signal};

use crate::platform::{self, Element, Event, EventSource, Listener, ListenerOptions, NodeRef, Platform};

/// What the trap is currently bound to
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TrapTarget {
	/// No trap; Tab is native
	#[default]
	Inactive,
	/// Trapped in the element of the reference given to [`use_focus_trap`]
	Bound,
	/// Trapped in an element passed to [`FocusTrap::set_focus_trap`]
	Explicit(Element),
}

impl TrapTarget {
	/// Whether a trap is set
	pub fn is_active(&self) -> bool {
		!matches!(self, Self::Inactive)
	}
}

/// Wraps Tab at the edges of `container`
fn cycle_focus(platform: &dyn Platform, container: &Element, event: &Event) {
	if event.key() != Some("Tab") {
		return;
	}

	let focusable = container.focusable_descendants();
	let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
		return;
	};
	let focused = platform.active_element();

	let (edge, wrap_to) = if event.shift_key() { (first, last) } else { (last, first) };
	if focused.as_ref() == Some(edge) {
		event.prevent_default();
		wrap_to.focus();
	}
}

/// Handle returned by [`use_focus_trap`]
pub struct FocusTrap {
	_keydown: Effect,
	platform: Rc<dyn Platform>,
	bound: Option<NodeRef>,
	target: Signal<TrapTarget>,
	last_focused: Rc<RefCell<Option<Element>>>,
}

impl FocusTrap {
	/// Trap focus in `target`, or in the bound reference when `None`.
	///
	/// The element focused right now is remembered for
	/// [`restore_focus_trap`](Self::restore_focus_trap). Without a target and
	/// without an attached bound reference this does nothing.
	pub fn set_focus_trap(&self, target: Option<Element>) {
		let bound_attached = self.bound.as_ref().is_some_and(NodeRef::is_attached);
		let next = match target {
			Some(element) => TrapTarget::Explicit(element),
			None if bound_attached => TrapTarget::Bound,
			None => {
				tracing::debug!("focus trap requested without a target");
				return;
			}
		};
		*self.last_focused.borrow_mut() = self.platform.active_element();
		self.target.set_if_changed(next);
	}

	/// Release the trap and focus the element remembered at activation.
	///
	/// Does nothing while inactive.
	pub fn restore_focus_trap(&self) {
		if !self.target.with_untracked(TrapTarget::is_active) {
			return;
		}
		if let Some(element) = self.last_focused.borrow_mut().take() {
			element.focus();
		}
		self.target.set(TrapTarget::Inactive);
	}

	/// Whether a trap is set (tracked)
	pub fn is_active(&self) -> bool {
		self.target.with(TrapTarget::is_active)
	}

	/// The current trap target (tracked)
	pub fn target(&self) -> TrapTarget {
		self.target.get()
	}
}

/// Keeps Tab / Shift+Tab cycling inside an element.
///
/// While a trap is set a `keydown` listener on the document wraps focus from
/// the last focusable descendant to the first and back. Presses away from
/// the edges keep their native behavior. The listener exists only while the
/// trap is active and follows the bound reference when it is re-pointed.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::dom_api::use_focus_trap;
/// use reinhardt_hooks::platform::NodeRef;
///
/// let dialog = NodeRef::new();
/// let trap = use_focus_trap(Some(dialog.clone()));
///
/// // on open
/// trap.set_focus_trap(None);
/// // on close
/// trap.restore_focus_trap();
/// ```
pub fn use_focus_trap(bound: Option<NodeRef>) -> FocusTrap {
	let platform = platform::current();
	let target = Signal::new(TrapTarget::Inactive);

	let keydown = Effect::with_cleanup({
		let platform = Rc::clone(&platform);
		let bound = bound.clone();
		let target = target.clone();
		move || {
			let container = match target.get() {
				TrapTarget::Inactive => None,
				TrapTarget::Bound => bound.as_ref().and_then(NodeRef::get),
				TrapTarget::Explicit(element) => Some(element),
			};
			let Some(container) = container else {
				return Cleanup::none();
			};
			let Some(document) = platform.event_target(EventSource::Document) else {
				return Cleanup::none();
			};

			let listener = Listener::new({
				let platform = Rc::clone(&platform);
				move |event| cycle_focus(platform.as_ref(), &container, event)
			});
			document.add_event_listener("keydown", &listener, ListenerOptions::default());

			Cleanup::new(move || {
				document.remove_event_listener("keydown", &listener, ListenerOptions::default());
			})
		}
	});

	FocusTrap {
		_keydown: keydown,
		platform,
		bound,
		target,
		last_focused: Rc::new(RefCell::new(None)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockPlatform;
	use rstest::rstest;
	use serial_test::serial;

	struct Dialog {
		opener: Element,
		container: Element,
		buttons: Vec<Element>,
	}

	fn dialog(mock: &MockPlatform) -> Dialog {
		let body = mock.body();
		let opener = mock.append(&body, "button", &[("id", "opener")]);
		let container = mock.append(&body, "div", &[("role", "dialog")]);
		let buttons = vec![
			mock.append(&container, "input", &[]),
			mock.append(&container, "a", &[("href", "#terms")]),
			mock.append(&container, "div", &[("tabindex", "-1")]),
			mock.append(&container, "button", &[]),
		];
		mock.append(&body, "button", &[("id", "after")]);
		Dialog {
			opener,
			container,
			buttons: buttons.into_iter().filter(|el| el.attribute("tabindex").is_none()).collect(),
		}
	}

	#[rstest]
	#[case::forward(false, 2, 0)]
	#[case::backward(true, 0, 2)]
	#[serial]
	fn test_tab_wraps_at_edges(#[case] shift: bool, #[case] from: usize, #[case] to: usize) {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(None);

		trap.set_focus_trap(Some(dialog.container.clone()));
		mock.flush();
		dialog.buttons[from].focus();

		let event = mock.press_key("Tab", shift);
		assert!(event.default_prevented());
		assert_eq!(mock.focused().as_ref(), Some(&dialog.buttons[to]));
	}

	#[test]
	#[serial]
	fn test_tab_inside_is_native() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(None);
		trap.set_focus_trap(Some(dialog.container.clone()));
		mock.flush();

		dialog.buttons[0].focus();
		let event = mock.press_key("Tab", false);
		assert!(!event.default_prevented());
		assert_eq!(mock.focused().as_ref(), Some(&dialog.buttons[1]));

		let event = mock.press_key("Enter", false);
		assert!(!event.default_prevented());
	}

	#[test]
	#[serial]
	fn test_inactive_trap_lets_focus_escape() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(None);
		assert!(!trap.is_active());

		dialog.buttons[2].focus();
		mock.press_key("Tab", false);
		assert_ne!(mock.focused().as_ref(), Some(&dialog.buttons[0]));
		assert_eq!(mock.document().listener_count("keydown"), 0);
	}

	#[test]
	#[serial]
	fn test_restore_returns_focus_and_detaches() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(Some(NodeRef::with_element(dialog.container.clone())));

		dialog.opener.focus();
		trap.set_focus_trap(None);
		mock.flush();
		assert_eq!(trap.target(), TrapTarget::Bound);
		assert_eq!(mock.document().listener_count("keydown"), 1);

		dialog.buttons[1].focus();
		trap.restore_focus_trap();
		mock.flush();
		assert!(!trap.is_active());
		assert_eq!(mock.focused().as_ref(), Some(&dialog.opener));
		assert_eq!(mock.document().listener_count("keydown"), 0);
	}

	#[test]
	#[serial]
	fn test_restore_when_inactive_is_a_no_op() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(None);
		dialog.buttons[0].focus();
		let calls = mock.focus_calls();

		trap.restore_focus_trap();
		trap.restore_focus_trap();
		assert_eq!(mock.focus_calls(), calls);
		assert_eq!(mock.focused().as_ref(), Some(&dialog.buttons[0]));
	}

	#[test]
	#[serial]
	fn test_set_without_any_target_stays_inactive() {
		let mock = MockPlatform::install();
		let trap = use_focus_trap(None);

		trap.set_focus_trap(None);
		mock.flush();
		assert!(!trap.is_active());
		assert_eq!(mock.document().listener_count("keydown"), 0);
	}

	#[test]
	#[serial]
	fn test_set_with_empty_bound_ref_stays_inactive() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let opener = mock.append(&mock.body(), "button", &[]);
		let trap = use_focus_trap(Some(NodeRef::new()));

		opener.focus();
		trap.set_focus_trap(None);
		mock.flush();
		assert!(!trap.is_active());
		assert_eq!(mock.document().listener_count("keydown"), 0);

		dialog.buttons[1].focus();
		trap.restore_focus_trap();
		assert_eq!(mock.focused().as_ref(), Some(&dialog.buttons[1]));
	}

	#[test]
	#[serial]
	fn test_bound_trap_follows_reference() {
		let mock = MockPlatform::install();
		let first = dialog(&mock);
		let second = dialog(&mock);
		let node_ref = NodeRef::with_element(first.container.clone());
		let trap = use_focus_trap(Some(node_ref.clone()));

		trap.set_focus_trap(None);
		mock.flush();
		node_ref.set(Some(second.container.clone()));
		mock.flush();
		assert_eq!(mock.document().listener_count("keydown"), 1);

		second.buttons[2].focus();
		mock.press_key("Tab", false);
		assert_eq!(mock.focused().as_ref(), Some(&second.buttons[0]));
	}

	#[test]
	#[serial]
	fn test_drop_detaches_listener() {
		let mock = MockPlatform::install();
		let dialog = dialog(&mock);
		let trap = use_focus_trap(None);
		trap.set_focus_trap(Some(dialog.container));
		mock.flush();

		drop(trap);
		assert_eq!(mock.document().listener_count("keydown"), 0);
	}
}
