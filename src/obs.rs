//! Optional observability helpers for credential operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `m2m_auth.credential` with the `op` and
//!   `cache_key` fields, plus `debug` events for acquisitions and invalidations. Secrets are never
//!   recorded.
//! - Enable `metrics` to increment the `m2m_auth_credential_total` counter for every
//!   attempt/cache hit/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Coordinator operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialOp {
	/// Resolving a token for an outbound request.
	Attach,
	/// Calling the identity provider.
	Acquire,
	/// Dropping the cached token.
	Invalidate,
}
impl CredentialOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialOp::Attach => "attach",
			CredentialOp::Acquire => "acquire",
			CredentialOp::Invalidate => "invalidate",
		}
	}
}
impl Display for CredentialOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialOutcome {
	/// Entry to a coordinator operation.
	Attempt,
	/// A cached token satisfied the request.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CredentialOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialOutcome::Attempt => "attempt",
			CredentialOutcome::CacheHit => "cache_hit",
			CredentialOutcome::Success => "success",
			CredentialOutcome::Failure => "failure",
		}
	}
}
impl Display for CredentialOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
