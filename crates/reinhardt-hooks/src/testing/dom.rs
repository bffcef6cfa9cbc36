//! In-memory DOM tree for [`MockPlatform`](super::MockPlatform).

use core::any::Any;
use core::cell::{Cell, RefCell};

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::platform::{DomNode, Element};

#[derive(Debug, Default)]
struct NodeData {
	tag: String,
	attributes: BTreeMap<String, String>,
	classes: BTreeSet<String>,
	styles: BTreeMap<String, String>,
	parent: Option<usize>,
	children: Vec<usize>,
}

impl NodeData {
	/// Same rule as `FOCUSABLE_SELECTOR`
	fn is_focusable(&self) -> bool {
		matches!(self.tag.as_str(), "input" | "select" | "textarea" | "button")
			|| self.attributes.contains_key("href")
			|| self
				.attributes
				.get("tabindex")
				.is_some_and(|value| !value.starts_with('-'))
	}
}

/// Node storage plus document-wide focus state
#[derive(Debug, Default)]
pub(crate) struct DomTree {
	nodes: RefCell<Vec<NodeData>>,
	focused: Cell<Option<usize>>,
	focus_calls: Cell<usize>,
}

impl DomTree {
	pub(crate) fn create(self: &Rc<Self>, tag: &str) -> Element {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData {
			tag: tag.to_ascii_lowercase(),
			..NodeData::default()
		});
		Element::new(MockNode {
			id: nodes.len() - 1,
			tree: Rc::clone(self),
		})
	}

	pub(crate) fn node(self: &Rc<Self>, id: usize) -> Element {
		Element::new(MockNode {
			id,
			tree: Rc::clone(self),
		})
	}

	pub(crate) fn append_child(&self, parent: usize, child: usize) {
		let mut nodes = self.nodes.borrow_mut();
		if let Some(previous) = nodes[child].parent.take() {
			nodes[previous].children.retain(|&id| id != child);
		}
		nodes[child].parent = Some(parent);
		nodes[parent].children.push(child);
	}

	/// `id` followed by its descendants, pre-order
	fn subtree(&self, id: usize) -> Vec<usize> {
		let nodes = self.nodes.borrow();
		let mut order = Vec::new();
		let mut stack = vec![id];
		while let Some(next) = stack.pop() {
			order.push(next);
			stack.extend(nodes[next].children.iter().rev());
		}
		order
	}

	pub(crate) fn focusable_in(self: &Rc<Self>, root: usize) -> Vec<Element> {
		let candidates = self.subtree(root);
		let nodes = self.nodes.borrow();
		candidates
			.into_iter()
			.skip(1)
			.filter(|&id| nodes[id].is_focusable())
			.map(|id| self.node(id))
			.collect()
	}

	/// Supports `tag`, `[attr]`, `[attr="value"]` and `tag[attr="value"]`
	pub(crate) fn select(self: &Rc<Self>, root: usize, selector: &str) -> Vec<Element> {
		let (tag, attribute) = match selector.split_once('[') {
			Some((tag, rest)) => (tag, Some(rest.trim_end_matches(']'))),
			None => (selector, None),
		};
		let attribute = attribute.map(|attr| match attr.split_once('=') {
			Some((name, value)) => (name, Some(value.trim_matches(|c| c == '"' || c == '\''))),
			None => (attr, None),
		});

		let candidates = self.subtree(root);
		let nodes = self.nodes.borrow();
		candidates
			.into_iter()
			.skip(1)
			.filter(|&id| {
				let node = &nodes[id];
				let tag_ok = tag.is_empty() || node.tag.eq_ignore_ascii_case(tag);
				let attribute_ok = match attribute {
					None => true,
					Some((name, None)) => node.attributes.contains_key(name),
					Some((name, Some(value))) => node.attributes.get(name).map(String::as_str) == Some(value),
				};
				tag_ok && attribute_ok
			})
			.map(|id| self.node(id))
			.collect()
	}

	pub(crate) fn focused(self: &Rc<Self>) -> Option<Element> {
		self.focused.get().map(|id| self.node(id))
	}

	pub(crate) fn blur(&self) {
		self.focused.set(None);
	}

	pub(crate) fn focus_calls(&self) -> usize {
		self.focus_calls.get()
	}
}

/// A node of the mock DOM
pub struct MockNode {
	id: usize,
	tree: Rc<DomTree>,
}

impl MockNode {
	pub(crate) fn id(&self) -> usize {
		self.id
	}

	pub(crate) fn belongs_to(&self, tree: &Rc<DomTree>) -> bool {
		Rc::ptr_eq(&self.tree, tree)
	}

	/// Lower-case tag name
	pub fn tag(&self) -> String {
		self.tree.nodes.borrow()[self.id].tag.clone()
	}

	/// Whether the class list contains `class`
	pub fn has_class(&self, class: &str) -> bool {
		self.tree.nodes.borrow()[self.id].classes.contains(class)
	}

	/// An inline style property
	pub fn style(&self, property: &str) -> Option<String> {
		self.tree.nodes.borrow()[self.id].styles.get(property).cloned()
	}
}

impl DomNode for MockNode {
	fn focus(&self) {
		self.tree.focus_calls.set(self.tree.focus_calls.get() + 1);
		self.tree.focused.set(Some(self.id));
	}

	fn is_same_node(&self, other: &dyn DomNode) -> bool {
		other
			.as_any()
			.downcast_ref::<MockNode>()
			.is_some_and(|other| other.id == self.id && Rc::ptr_eq(&other.tree, &self.tree))
	}

	fn focusable_descendants(&self) -> Vec<Element> {
		self.tree.focusable_in(self.id)
	}

	fn attribute(&self, name: &str) -> Option<String> {
		self.tree.nodes.borrow()[self.id].attributes.get(name).cloned()
	}

	fn set_attribute(&self, name: &str, value: &str) {
		self.tree.nodes.borrow_mut()[self.id]
			.attributes
			.insert(name.to_string(), value.to_string());
	}

	fn toggle_class(&self, class: &str, force: bool) {
		let mut nodes = self.tree.nodes.borrow_mut();
		let classes = &mut nodes[self.id].classes;
		if force {
			classes.insert(class.to_string());
		} else {
			classes.remove(class);
		}
	}

	fn set_style(&self, property: &str, value: &str) {
		self.tree.nodes.borrow_mut()[self.id]
			.styles
			.insert(property.to_string(), value.to_string());
	}

	fn remove_style(&self, property: &str) {
		self.tree.nodes.borrow_mut()[self.id].styles.remove(property);
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn tree_with(children: &[(&str, &[(&str, &str)])]) -> (Rc<DomTree>, Element) {
		let tree = Rc::new(DomTree::default());
		let root = tree.create("div");
		let root_id = root.downcast_ref::<MockNode>().map(MockNode::id).unwrap();
		for (tag, attributes) in children {
			let child = tree.create(tag);
			for (name, value) in *attributes {
				child.set_attribute(name, value);
			}
			let child_id = child.downcast_ref::<MockNode>().map(MockNode::id).unwrap();
			tree.append_child(root_id, child_id);
		}
		(tree, root)
	}

	#[rstest]
	#[case("button", &[], true)]
	#[case("a", &[("href", "/")], true)]
	#[case("div", &[("tabindex", "0")], true)]
	#[case("div", &[("tabindex", "-1")], false)]
	#[case("div", &[], false)]
	fn test_focusable_rule(#[case] tag: &str, #[case] attributes: &[(&str, &str)], #[case] focusable: bool) {
		let (_tree, root) = tree_with(&[(tag, attributes)]);
		assert_eq!(root.focusable_descendants().len(), usize::from(focusable));
	}

	#[test]
	fn test_select_by_tag_and_attribute() {
		let (tree, root) = tree_with(&[
			("meta", &[("name", "theme-color")]),
			("meta", &[("name", "viewport")]),
		]);
		let root_id = root.downcast_ref::<MockNode>().map(MockNode::id).unwrap();

		assert_eq!(tree.select(root_id, "meta").len(), 2);
		assert_eq!(tree.select(root_id, "meta[name=\"theme-color\"]").len(), 1);
		assert_eq!(tree.select(root_id, "[name]").len(), 2);
	}

	#[test]
	fn test_focus_is_document_wide() {
		let (tree, root) = tree_with(&[("input", &[]), ("button", &[])]);
		let focusables = root.focusable_descendants();

		focusables[1].focus();
		assert_eq!(tree.focused(), Some(focusables[1].clone()));
		assert_eq!(tree.focus_calls(), 1);
	}
}
