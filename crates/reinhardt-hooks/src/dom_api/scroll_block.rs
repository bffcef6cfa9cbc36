//! Overflow blocking: use_scroll_block

use std::rc::Rc;

use crate::platform::{self, Element, Platform};

/// Handle returned by [`use_scroll_block`]
pub struct ScrollBlock {
	platform: Rc<dyn Platform>,
	target: Option<Element>,
}

impl ScrollBlock {
	fn resolve(&self) -> Option<Element> {
		self.target.clone().or_else(|| self.platform.document_element())
	}

	/// Hide the target's overflow, padding for the vanished scrollbar
	pub fn block_scroll(&self) {
		let Some(element) = self.resolve() else {
			return;
		};
		element.set_style("overflow", "hidden");

		let scrollbar = self.platform.scrollbar_width();
		if scrollbar > 0.0 {
			element.set_style("padding-right", &format!("{scrollbar}px"));
		}
	}

	/// Undo [`block_scroll`](Self::block_scroll)
	pub fn restore_scroll(&self) {
		let Some(element) = self.resolve() else {
			return;
		};
		element.remove_style("overflow");
		element.remove_style("padding-right");
	}
}

/// Blocks scrolling of `target`, the document element by default
pub fn use_scroll_block(target: Option<Element>) -> ScrollBlock {
	ScrollBlock {
		platform: platform::current(),
		target,
	}
}
