//! Platform-neutral DOM handles.

use core::any::Any;
use core::fmt;

use std::rc::Rc;

use reinhardt_reactive::Signal;

/// Selector matching the elements a keyboard user can Tab to.
///
/// Negative `tabindex` values opt an element out.
pub const FOCUSABLE_SELECTOR: &str =
	"input, select, textarea, button, [href], [tabindex]:not([tabindex^='-'])";

/// Operations the hooks need from a DOM node.
///
/// Implemented by each platform's node type; hooks only ever see [`Element`].
pub trait DomNode: Any {
	/// Move keyboard focus to this node
	fn focus(&self);

	/// Identity comparison against another node of the same platform
	fn is_same_node(&self, other: &dyn DomNode) -> bool;

	/// Focusable descendants in document order (see [`FOCUSABLE_SELECTOR`])
	fn focusable_descendants(&self) -> Vec<Element>;

	/// Read an attribute
	fn attribute(&self, name: &str) -> Option<String>;

	/// Write an attribute
	fn set_attribute(&self, name: &str, value: &str);

	/// Add (`force = true`) or remove a class name
	fn toggle_class(&self, class: &str, force: bool);

	/// Set an inline style property
	fn set_style(&self, property: &str, value: &str);

	/// Remove an inline style property
	fn remove_style(&self, property: &str);

	/// Upcast used by platforms to recover their concrete node type
	fn as_any(&self) -> &dyn Any;
}

/// A cheap-to-clone handle to a DOM element.
///
/// Equality is node identity.
#[derive(Clone)]
pub struct Element(Rc<dyn DomNode>);

impl Element {
	/// Wrap a platform node
	pub fn new(node: impl DomNode + 'static) -> Self {
		Self(Rc::new(node))
	}

	/// Downcast to the platform's node type
	pub fn downcast_ref<T: DomNode>(&self) -> Option<&T> {
		self.0.as_any().downcast_ref::<T>()
	}

	/// Move keyboard focus to this element
	pub fn focus(&self) {
		self.0.focus();
	}

	/// Focusable descendants in document order
	pub fn focusable_descendants(&self) -> Vec<Element> {
		self.0.focusable_descendants()
	}

	/// Read an attribute
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.0.attribute(name)
	}

	/// Write an attribute
	pub fn set_attribute(&self, name: &str, value: &str) {
		self.0.set_attribute(name, value);
	}

	/// Add or remove a class name
	pub fn toggle_class(&self, class: &str, force: bool) {
		self.0.toggle_class(class, force);
	}

	/// Set an inline style property
	pub fn set_style(&self, property: &str, value: &str) {
		self.0.set_style(property, value);
	}

	/// Remove an inline style property
	pub fn remove_style(&self, property: &str) {
		self.0.remove_style(property);
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0) || self.0.is_same_node(other.0.as_ref())
	}
}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("id", &self.attribute("id"))
			.finish_non_exhaustive()
	}
}

/// A reactive slot holding the element a hook is bound to.
///
/// Reading it inside an effect makes the effect re-run when the element is
/// mounted, replaced, or removed.
#[derive(Clone, Debug)]
pub struct NodeRef(Signal<Option<Element>>);

impl NodeRef {
	/// An empty reference
	pub fn new() -> Self {
		Self(Signal::new(None))
	}

	/// A reference already pointing at `element`
	pub fn with_element(element: Element) -> Self {
		Self(Signal::new(Some(element)))
	}

	/// Current element, tracked
	pub fn get(&self) -> Option<Element> {
		self.0.get()
	}

	/// Current element, untracked
	pub fn get_untracked(&self) -> Option<Element> {
		self.0.get_untracked()
	}

	/// Point the reference at a new element (or none)
	pub fn set(&self, element: Option<Element>) {
		self.0.set(element);
	}

	/// Whether an element is attached, untracked
	pub fn is_attached(&self) -> bool {
		self.0.with_untracked(Option::is_some)
	}
}

impl Default for NodeRef {
	fn default() -> Self {
		Self::new()
	}
}

impl From<Element> for NodeRef {
	fn from(element: Element) -> Self {
		Self::with_element(element)
	}
}
