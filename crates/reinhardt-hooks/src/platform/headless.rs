//! Headless platform for server rendering and native builds.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use super::{
	Element, EventSource, EventTarget, IntersectionCallback, IntersectionObserver, ObserverInit,
	Platform, Storage, StorageKind, TimerId, WakeLockApi,
};
use crate::error::PlatformError;

/// A platform without a browser.
///
/// There is no window, document, storage, observer, or wake lock. Timers are
/// accepted but never fire, matching a render pass that ends before any
/// timeout elapses. Spawned tasks are polled until they stall.
pub struct HeadlessPlatform {
	next_timer: Cell<i64>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
}

impl HeadlessPlatform {
	/// Create a headless platform
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Self {
			next_timer: Cell::new(1),
			pool: RefCell::new(pool),
			spawner,
		}
	}

	fn next_timer_id(&self) -> TimerId {
		let id = self.next_timer.get();
		self.next_timer.set(id + 1);
		TimerId::new(id)
	}
}

impl Default for HeadlessPlatform {
	fn default() -> Self {
		Self::new()
	}
}

impl Platform for HeadlessPlatform {
	fn is_client(&self) -> bool {
		false
	}

	fn set_timeout(&self, delay: Duration, _callback: Box<dyn FnOnce()>) -> TimerId {
		tracing::trace!(?delay, "headless timeout never fires");
		self.next_timer_id()
	}

	fn clear_timeout(&self, _id: TimerId) {}

	fn set_interval(&self, delay: Duration, _callback: Rc<dyn Fn()>) -> TimerId {
		tracing::trace!(?delay, "headless interval never fires");
		self.next_timer_id()
	}

	fn clear_interval(&self, _id: TimerId) {}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		if let Err(err) = self.spawner.spawn_local(task) {
			tracing::error!(error = %err, "failed to spawn task");
			return;
		}
		// A task spawned from inside a running task is picked up by the outer poll
		if let Ok(mut pool) = self.pool.try_borrow_mut() {
			pool.run_until_stalled();
		}
	}

	fn event_target(&self, _source: EventSource<'_>) -> Option<Rc<dyn EventTarget>> {
		None
	}

	fn match_media(&self, _query: &str) -> Option<bool> {
		None
	}

	fn create_intersection_observer(
		&self,
		_callback: IntersectionCallback,
		_init: ObserverInit,
	) -> Result<Rc<dyn IntersectionObserver>, PlatformError> {
		Err(PlatformError::Unsupported("IntersectionObserver"))
	}

	fn active_element(&self) -> Option<Element> {
		None
	}

	fn document_element(&self) -> Option<Element> {
		None
	}

	fn query_selector_all(&self, _selector: &str) -> Vec<Element> {
		Vec::new()
	}

	fn storage(&self, _kind: StorageKind) -> Option<Rc<dyn Storage>> {
		None
	}

	fn document_hidden(&self) -> bool {
		false
	}

	fn is_online(&self) -> bool {
		true
	}

	fn wake_lock(&self) -> Option<Rc<dyn WakeLockApi>> {
		None
	}
}
