//! Render lifecycle helpers: use_is_first_render, use_update_effect,
//! use_effect_once and use_is_client

use core::cell::{Cell, RefCell};

use std::rc::Rc;

use reinhardt_reactive::{Cleanup, Effect, Signal, untrack};

use crate::platform;

/// Answers `true` exactly once
#[derive(Debug)]
pub struct FirstRender(Cell<bool>);

impl FirstRender {
	/// `true` on the first call, `false` afterwards
	pub fn check(&self) -> bool {
		self.0.replace(false)
	}
}

/// Creates a first-render detector
pub fn use_is_first_render() -> FirstRender {
	FirstRender(Cell::new(true))
}

/// Handle of [`use_update_effect`]; dropping it runs the pending cleanup
pub struct UpdateEffect {
	effect: Effect,
	cleanup: Rc<RefCell<Cleanup>>,
}

impl UpdateEffect {
	/// Stop reacting and run the pending cleanup
	pub fn dispose(&self) {
		self.effect.dispose();
		let cleanup = core::mem::take(&mut *self.cleanup.borrow_mut());
		cleanup.run();
	}
}

impl Drop for UpdateEffect {
	fn drop(&mut self) {
		self.dispose();
	}
}

/// Runs `effect` whenever the value computed by `deps` changes, skipping the
/// initial run.
///
/// `deps` is tracked; `effect` is not. The cleanup returned by `effect` runs
/// before its next run and on drop.
///
/// # Example
///
/// ```ignore
/// let (query, set_query) = use_state(String::new());
///
/// let _reset_page = use_update_effect(
///     move || query.get(),
///     move |_| {
///         set_page.set(1);
///         Cleanup::none()
///     },
/// );
/// ```
pub fn use_update_effect<D, Deps, F>(mut deps: Deps, mut effect: F) -> UpdateEffect
where
	D: PartialEq + 'static,
	Deps: FnMut() -> D + 'static,
	F: FnMut(&D) -> Cleanup + 'static,
{
	let cleanup = Rc::new(RefCell::new(Cleanup::none()));
	let mut previous: Option<D> = None;

	let watcher = Effect::new({
		let cleanup = Rc::clone(&cleanup);
		move || {
			let current = deps();
			let changed = previous.as_ref().is_some_and(|previous| *previous != current);
			if changed {
				let stale = core::mem::take(&mut *cleanup.borrow_mut());
				untrack(|| stale.run());
				let next = untrack(|| effect(&current));
				*cleanup.borrow_mut() = next;
			}
			previous = Some(current);
		}
	});

	UpdateEffect {
		effect: watcher,
		cleanup,
	}
}

/// Guard of [`use_effect_once`]
pub struct EffectOnce {
	cleanup: Cleanup,
}

impl Drop for EffectOnce {
	fn drop(&mut self) {
		core::mem::take(&mut self.cleanup).run();
	}
}

/// Runs `effect` once, now and untracked; its cleanup runs on drop
pub fn use_effect_once<F>(effect: F) -> EffectOnce
where
	F: FnOnce() -> Cleanup,
{
	EffectOnce {
		cleanup: untrack(effect),
	}
}

/// `true` once mounted on a client platform, `false` during server renders
pub fn use_is_client() -> Signal<bool> {
	let platform = platform::current();
	let is_client = Signal::new(false);
	let _mount = use_effect_once({
		let is_client = is_client.clone();
		move || {
			if platform.is_client() {
				is_client.set(true);
			}
			Cleanup::none()
		}
	});
	is_client
}
