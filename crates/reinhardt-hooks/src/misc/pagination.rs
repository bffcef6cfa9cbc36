//! Pagination math: paginate, use_pagination, use_pagination_with

use reinhardt_reactive::{Memo, Signal};
use serde::{Deserialize, Serialize};

/// Input of [`paginate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginateOptions {
	pub per_page: u64,
	/// Index of the first item shown
	pub offset: u64,
	pub total: u64,
}

impl Default for PaginateOptions {
	fn default() -> Self {
		Self {
			per_page: 10,
			offset: 0,
			total: 0,
		}
	}
}

impl PaginateOptions {
	pub fn per_page(mut self, per_page: u64) -> Self {
		self.per_page = per_page;
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = offset;
		self
	}

	pub fn total(mut self, total: u64) -> Self {
		self.total = total;
		self
	}
}

/// Output of [`paginate`]; page numbers are 1-based
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub pages: u64,
	/// `0` when there are no pages
	pub current_page: u64,
	pub previous_page: Option<u64>,
	pub next_page: Option<u64>,
}

/// Page numbers for a window of `per_page` items starting at `offset`
pub fn paginate(options: &PaginateOptions) -> Pagination {
	if options.per_page == 0 || options.total == 0 {
		return Pagination::default();
	}

	let pages = options.total.div_ceil(options.per_page);
	let current_page = (options.offset / options.per_page + 1).min(pages);

	Pagination {
		pages,
		current_page,
		previous_page: (current_page > 1).then(|| current_page - 1),
		next_page: (current_page < pages).then(|| current_page + 1),
	}
}

/// [`use_pagination`] with a custom paginator.
///
/// The paginator runs again only when the options differ from the ones of
/// its last run; setting equal options keeps the cached result.
pub fn use_pagination_with<P>(options: impl Into<Signal<PaginateOptions>>, paginator: P) -> Memo<Pagination>
where
	P: Fn(&PaginateOptions) -> Pagination + 'static,
{
	let options = options.into();
	let mut last: Option<(PaginateOptions, Pagination)> = None;

	Memo::new(move || {
		let current = options.get();
		if let Some((previous, pagination)) = &last {
			if *previous == current {
				return *pagination;
			}
		}
		let pagination = paginator(&current);
		last = Some((current, pagination));
		pagination
	})
}

/// Pagination derived from `options`.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::misc::{use_pagination, PaginateOptions};
///
/// let pagination = use_pagination(PaginateOptions::default().offset(30).total(100));
/// assert_eq!(pagination.get().current_page, 4);
/// ```
pub fn use_pagination(options: impl Into<Signal<PaginateOptions>>) -> Memo<Pagination> {
	use_pagination_with(options, paginate)
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;
	use rstest::rstest;
	use serial_test::serial;
	use std::rc::Rc;

	#[rstest]
	#[case(10, 30, 100, 10, 4, Some(3), Some(5))]
	#[case(10, 0, 100, 10, 1, None, Some(2))]
	#[case(10, 95, 100, 10, 10, Some(9), None)]
	#[case(10, 0, 5, 1, 1, None, None)]
	#[case(7, 0, 15, 3, 1, None, Some(2))]
	#[case(10, 500, 100, 10, 10, Some(9), None)]
	#[case(10, 0, 0, 0, 0, None, None)]
	#[case(0, 0, 100, 0, 0, None, None)]
	fn test_paginate(
		#[case] per_page: u64,
		#[case] offset: u64,
		#[case] total: u64,
		#[case] pages: u64,
		#[case] current_page: u64,
		#[case] previous_page: Option<u64>,
		#[case] next_page: Option<u64>,
	) {
		let options = PaginateOptions { per_page, offset, total };
		assert_eq!(
			paginate(&options),
			Pagination { pages, current_page, previous_page, next_page }
		);
	}

	#[test]
	fn test_options_deserialize_with_defaults() {
		let options: PaginateOptions = serde_json::from_str(r#"{"total":42}"#).unwrap();
		assert_eq!(options, PaginateOptions::default().total(42));

		let options: PaginateOptions = serde_json::from_str(r#"{"perPage":5,"offset":10}"#).unwrap();
		assert_eq!(options.per_page, 5);
	}

	#[test]
	#[serial]
	fn test_recomputes_only_on_changed_options() {
		let options = Signal::new(PaginateOptions { per_page: 10, offset: 30, total: 100 });
		let runs = Rc::new(Cell::new(0));
		let pagination = use_pagination_with(options.clone(), {
			let runs = Rc::clone(&runs);
			move |options| {
				runs.set(runs.get() + 1);
				paginate(options)
			}
		});

		assert_eq!(pagination.get().current_page, 4);
		assert_eq!(pagination.get().current_page, 4);
		assert_eq!(runs.get(), 1);

		options.set(PaginateOptions { per_page: 10, offset: 30, total: 100 });
		assert_eq!(pagination.get().current_page, 4);
		assert_eq!(runs.get(), 1);

		options.set(PaginateOptions { per_page: 10, offset: 40, total: 100 });
		assert_eq!(pagination.get().current_page, 5);
		assert_eq!(runs.get(), 2);
	}
}
