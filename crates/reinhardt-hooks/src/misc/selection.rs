//! Selection state over a list of items: use_selection

use reinhardt_reactive::Signal;

/// Selection handle returned by [`use_selection`]
#[derive(Clone)]
pub struct Selection<V: 'static> {
	items: Signal<Vec<V>>,
	selection: Signal<Vec<V>>,
	initial: Vec<V>,
}

impl<V> Selection<V>
where
	V: Clone + PartialEq + 'static,
{
	/// Selected entries in selection order (tracked)
	pub fn selection(&self) -> Vec<V> {
		self.selection.get()
	}

	/// The selection cell
	pub fn signal(&self) -> Signal<Vec<V>> {
		self.selection.clone()
	}

	/// Whether anything is selected (tracked)
	pub fn has_selection(&self) -> bool {
		self.selection.with(|selection| !selection.is_empty())
	}

	/// Whether `entry` is selected (tracked)
	pub fn is_selected(&self, entry: &V) -> bool {
		self.selection.with(|selection| selection.contains(entry))
	}

	/// Replace the selection
	pub fn set_selection(&self, selection: Vec<V>) {
		self.selection.set(selection);
	}

	/// Compute the next selection from the current one
	pub fn update_selection<F>(&self, f: F)
	where
		F: FnOnce(&[V]) -> Vec<V>,
	{
		let next = self.selection.with_untracked(|selection| f(selection));
		self.selection.set(next);
	}

	/// Add `entry`, or remove it when already selected
	pub fn select(&self, entry: V) {
		self.selection.update(|selection| {
			match selection.iter().position(|selected| *selected == entry) {
				Some(index) => {
					selection.remove(index);
				}
				None => selection.push(entry),
			}
		});
	}

	/// Select every item from the first selected entry up to `entry`.
	///
	/// Items are taken in traversal order: ascending when `entry` comes after
	/// the anchor, descending when it comes before. With nothing selected
	/// only `entry` is selected. Entries missing from the items leave the
	/// selection unchanged.
	pub fn group_select(&self, entry: V) {
		let next = self.items.with_untracked(|items| {
			self.selection
				.with_untracked(|selection| group_range(items, selection, entry))
		});
		if let Some(next) = next {
			self.selection.set(next);
		}
	}

	/// Select every item
	pub fn select_all(&self) {
		self.selection.set(self.items.get_untracked());
	}

	/// Clear the selection, or go back to the initial one
	pub fn reset_selection(&self, to_initial: bool) {
		let next = if to_initial { self.initial.clone() } else { Vec::new() };
		self.selection.set(next);
	}
}

fn group_range<V: Clone + PartialEq>(items: &[V], selection: &[V], entry: V) -> Option<Vec<V>> {
	let Some(anchor) = selection.first() else {
		return Some(vec![entry]);
	};
	let from = items.iter().position(|item| item == anchor);
	let to = items.iter().position(|item| *item == entry);
	let (Some(from), Some(to)) = (from, to) else {
		tracing::debug!("group selection bound is not one of the items");
		return None;
	};

	if from <= to {
		Some(items[from..=to].to_vec())
	} else {
		Some(items[to..=from].iter().rev().cloned().collect())
	}
}

/// Manages which of `items` are selected.
///
/// # Example
///
/// ```ignore
/// use reinhardt_hooks::misc::use_selection;
///
/// let rows = use_selection((1..=10).collect::<Vec<_>>(), vec![1]);
/// rows.group_select(5);
/// assert_eq!(rows.selection(), vec![1, 2, 3, 4, 5]);
///
/// rows.select(3);
/// assert!(!rows.is_selected(&3));
/// ```
pub fn use_selection<V>(items: impl Into<Signal<Vec<V>>>, initial: Vec<V>) -> Selection<V>
where
	V: Clone + PartialEq + 'static,
{
	Selection {
		items: items.into(),
		selection: Signal::new(initial.clone()),
		initial,
	}
}
