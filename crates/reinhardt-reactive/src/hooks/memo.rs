//! Memoization hook: use_memo

use crate::memo::Memo;

/// Memoizes a computed value.
///
/// Equivalent of React's `useMemo`; dependencies are tracked automatically and
/// the computation re-runs lazily on the next read after one of them changed.
///
/// ```ignore
/// let (items, _set_items) = use_state(vec![3, 1, 2]);
/// let sorted = use_memo(move || {
///     let mut items = items.get();
///     items.sort();
///     items
/// });
/// ```
pub fn use_memo<T, F>(f: F) -> Memo<T>
where
	T: Clone + 'static,
	F: FnMut() -> T + 'static,
{
	Memo::new(f)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::signal::Signal;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_use_memo_follows_source() {
		let items = Signal::new(vec![3, 1, 2]);
		let sorted = use_memo({
			let items = items.clone();
			move || {
				let mut items = items.get();
				items.sort_unstable();
				items
			}
		});

		assert_eq!(sorted.get(), vec![1, 2, 3]);

		items.set(vec![9, 4]);
		assert_eq!(sorted.get(), vec![4, 9]);
	}
}
