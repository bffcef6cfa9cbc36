//! use_defer_callback

use core::future::Future;
use core::time::Duration;

use std::rc::Rc;

use futures::channel::oneshot;

use crate::platform::{self, Platform};

/// A callback whose body runs on a later timer turn
pub struct DeferredCallback<A: 'static, R: 'static> {
	task: Rc<dyn Fn(A) -> R>,
	platform: Rc<dyn Platform>,
}

impl<A: 'static, R: 'static> Clone for DeferredCallback<A, R> {
	fn clone(&self) -> Self {
		Self {
			task: Rc::clone(&self.task),
			platform: Rc::clone(&self.platform),
		}
	}
}

impl<A: 'static, R: 'static> DeferredCallback<A, R> {
	/// Schedule the task with `args`.
	///
	/// The future resolves to the task's result, or `None` if the platform
	/// dropped the timer before it fired.
	pub fn call(&self, args: A) -> impl Future<Output = Option<R>> + 'static {
		let (sender, receiver) = oneshot::channel();
		let task = Rc::clone(&self.task);
		self.platform.set_timeout(
			Duration::ZERO,
			Box::new(move || {
				// The caller may have stopped waiting
				let _ = sender.send(task(args));
			}),
		);
		async move { receiver.await.ok() }
	}
}

/// Wraps `task` so every call runs it after the current turn.
///
/// Useful to keep event handlers short: the handler returns immediately and
/// the work happens on the next timer tick.
pub fn use_defer_callback<A, R, F>(task: F) -> DeferredCallback<A, R>
where
	F: Fn(A) -> R + 'static,
{
	DeferredCallback {
		task: Rc::new(task),
		platform: platform::current(),
	}
}
