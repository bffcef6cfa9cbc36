//! Error types for hooks and the platform layer.
//!
//! Nothing here escapes a hook's mount/update/unmount path: hooks catch these
//! errors, log them, and fall back to a degraded state.

/// Failures reported by a [`Platform`](crate::platform::Platform) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
	/// The capability does not exist in this environment
	#[error("{0} is not available on this platform")]
	Unsupported(&'static str),

	/// An option was rejected when constructing a platform resource
	#[error("invalid {option}: {reason}")]
	InvalidOption {
		/// Name of the offending option
		option: &'static str,
		/// Why it was rejected
		reason: String,
	},

	/// The platform refused a request (e.g. wake lock `NotAllowedError`)
	#[error("request rejected ({name}): {message}")]
	Rejected {
		/// Platform error name
		name: String,
		/// Platform error message
		message: String,
	},

	/// A storage backend failed (quota exceeded, access denied)
	#[error("storage error: {0}")]
	Storage(String),

	/// Any other exception raised by the host
	#[error("host error: {0}")]
	Js(String),
}

impl PlatformError {
	/// Shorthand for [`PlatformError::InvalidOption`]
	pub fn invalid_option(option: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidOption {
			option,
			reason: reason.into(),
		}
	}

	/// Whether the error only signals a missing capability
	pub fn is_unsupported(&self) -> bool {
		matches!(self, Self::Unsupported(_))
	}
}

/// Errors surfaced by hook internals
#[derive(Debug, thiserror::Error)]
pub enum HookError {
	/// A platform call failed
	#[error(transparent)]
	Platform(#[from] PlatformError),

	/// A stored value could not be encoded or decoded
	#[error("stored value is not valid JSON for the requested type: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A consumer callback returned an error
	#[error("callback failed: {0:#}")]
	Callback(#[source] anyhow::Error),
}

/// Result alias for hook internals
pub type Result<T, E = HookError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(PlatformError::Unsupported("IntersectionObserver"), "IntersectionObserver is not available on this platform")]
	#[case(PlatformError::invalid_option("rootMargin", "expected px or %"), "invalid rootMargin: expected px or %")]
	#[case(
		PlatformError::Rejected { name: "NotAllowedError".into(), message: "denied".into() },
		"request rejected (NotAllowedError): denied"
	)]
	fn test_platform_error_display(#[case] error: PlatformError, #[case] expected: &str) {
		assert_eq!(error.to_string(), expected);
	}

	#[test]
	fn test_hook_error_wraps_platform_error_transparently() {
		let error = HookError::from(PlatformError::Storage("quota exceeded".into()));
		assert_eq!(error.to_string(), "storage error: quota exceeded");
	}

	#[test]
	fn test_callback_error_keeps_context_chain() {
		let source = anyhow::anyhow!("network down").context("on_enter");
		let error = HookError::Callback(source);
		assert_eq!(error.to_string(), "callback failed: on_enter: network down");
	}
}
