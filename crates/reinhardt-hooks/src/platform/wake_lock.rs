//! Screen wake lock.

use futures::future::LocalBoxFuture;
use std::rc::Rc;

use super::event::EventTarget;
use crate::error::PlatformError;

/// Entry point of the Screen Wake Lock API
pub trait WakeLockApi {
	/// Request a screen wake lock
	fn request(&self) -> LocalBoxFuture<'static, Result<Rc<dyn WakeLockSentinel>, PlatformError>>;
}

/// A held wake lock.
///
/// Fires a `release` event when released, by the page or by the platform.
pub trait WakeLockSentinel: EventTarget {
	/// Whether the lock has been released
	fn released(&self) -> bool;

	/// Release the lock
	fn release(&self) -> LocalBoxFuture<'static, Result<(), PlatformError>>;
}
