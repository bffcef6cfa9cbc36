//! Intersection observation.

use std::rc::Rc;

use super::dom::Element;
use crate::error::PlatformError;

/// One intersection observation of one target
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
	/// Whether the target intersects the root beyond a threshold
	pub is_intersecting: bool,
	/// Visible fraction of the target, `0.0..=1.0`
	pub intersection_ratio: f64,
	/// Observation timestamp in milliseconds
	pub time: f64,
	/// The observed element
	pub target: Element,
}

/// Callback invoked by the platform with each batch of entries
pub type IntersectionCallback = Rc<dyn Fn(Vec<IntersectionEntry>)>;

/// Observer construction parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObserverInit {
	/// Scroll container; `None` is the document viewport
	pub root: Option<Element>,
	/// CSS margin around the root, e.g. `"10px 0px"`
	pub root_margin: Option<String>,
	/// Visibility ratios that trigger a callback
	pub thresholds: Vec<f64>,
}

impl ObserverInit {
	/// Check the options the way a browser would before constructing.
	///
	/// The margin takes one to four `<number>px` or `<number>%` tokens and every
	/// threshold must lie within `0.0..=1.0`.
	pub fn validate(&self) -> Result<(), PlatformError> {
		if let Some(margin) = &self.root_margin {
			let tokens: Vec<&str> = margin.split_whitespace().collect();
			if tokens.is_empty() || tokens.len() > 4 {
				return Err(PlatformError::invalid_option(
					"rootMargin",
					format!("expected 1 to 4 lengths, got {:?}", margin),
				));
			}
			for token in tokens {
				if !is_margin_length(token) {
					return Err(PlatformError::invalid_option(
						"rootMargin",
						format!("{:?} must be in pixels or percent", token),
					));
				}
			}
		}

		if let Some(bad) = self
			.thresholds
			.iter()
			.find(|threshold| !(0.0..=1.0).contains(*threshold))
		{
			return Err(PlatformError::invalid_option(
				"threshold",
				format!("{bad} is outside the range [0.0, 1.0]"),
			));
		}

		Ok(())
	}
}

fn is_margin_length(token: &str) -> bool {
	if token == "0" {
		return true;
	}
	token
		.strip_suffix("px")
		.or_else(|| token.strip_suffix('%'))
		.is_some_and(|number| !number.is_empty() && number.parse::<f64>().is_ok())
}

/// A live intersection observer.
///
/// Disconnecting stops all further callbacks.
pub trait IntersectionObserver {
	/// Start observing `target`
	fn observe(&self, target: &Element);

	/// Stop observing `target`
	fn unobserve(&self, target: &Element);

	/// Stop observing everything
	fn disconnect(&self);

	/// Thresholds the observer was created with
	fn thresholds(&self) -> Vec<f64>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(None, vec![0.0, 1.0], true)]
	#[case(Some("10px"), vec![], true)]
	#[case(Some("10px 0px -5% 0"), vec![0.5], true)]
	#[case(Some("10em"), vec![], false)]
	#[case(Some("1px 2px 3px 4px 5px"), vec![], false)]
	#[case(Some(""), vec![], false)]
	#[case(None, vec![1.5], false)]
	#[case(None, vec![-0.1], false)]
	fn test_validate(#[case] margin: Option<&str>, #[case] thresholds: Vec<f64>, #[case] ok: bool) {
		let init = ObserverInit {
			root: None,
			root_margin: margin.map(str::to_string),
			thresholds,
		};
		assert_eq!(init.validate().is_ok(), ok);
	}
}
