//! Expiring key/value cache contract and the built-in in-memory implementation.
//!
//! Entries carry an optional expiry instant. Expired entries are never returned: reads treat
//! them exactly like keys that were never set. There is no background sweeper, so eviction only
//! happens when an expired key is read again (or explicitly deleted).

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`ExpiringCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract shared by every coordinator wired to the same cache instance.
pub trait ExpiringCache
where
	Self: Send + Sync,
{
	/// Stores `value` under `key`, replacing any previous value and expiry.
	///
	/// `None` and a zero TTL mean the entry never expires. A negative TTL stores an entry that
	/// is already expired.
	fn set<'a>(
		&'a self,
		key: &'a str,
		value: CacheValue,
		ttl: Option<Duration>,
	) -> CacheFuture<'a, ()>;

	/// Returns the value under `key` unless it is missing or expired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheValue>>;

	/// Removes `key` and its expiry. Removing a missing key is a no-op.
	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()>;

	/// Returns the string value under `key`.
	///
	/// A missing or expired entry yields `Ok(None)`; a live entry of another type yields
	/// [`CacheError::TypeMismatch`].
	fn get_string<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		Box::pin(async move {
			match self.get(key).await? {
				Some(CacheValue::String(value)) => Ok(Some(value)),
				Some(other) => Err(CacheError::TypeMismatch {
					key: key.to_owned(),
					expected: "string",
					found: other.kind(),
				}),
				None => Ok(None),
			}
		})
	}
}

/// Value stored in an [`ExpiringCache`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheValue {
	/// UTF-8 text.
	String(String),
	/// Raw bytes.
	Bytes(Vec<u8>),
	/// Signed integer.
	Int(i64),
}
impl CacheValue {
	/// Returns a stable label for the variant.
	pub const fn kind(&self) -> &'static str {
		match self {
			CacheValue::String(_) => "string",
			CacheValue::Bytes(_) => "bytes",
			CacheValue::Int(_) => "int",
		}
	}
}
impl From<String> for CacheValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<&str> for CacheValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}
impl From<Vec<u8>> for CacheValue {
	fn from(value: Vec<u8>) -> Self {
		Self::Bytes(value)
	}
}
impl From<i64> for CacheValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

/// Error type produced by [`ExpiringCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CacheError {
	/// A typed accessor found a live value of a different type.
	#[error("Cache entry `{key}` holds a {found} value, not a {expected}.")]
	TypeMismatch {
		/// Key that was read.
		key: String,
		/// Type the accessor expected.
		expected: &'static str,
		/// Type actually stored.
		found: &'static str,
	},
	/// Backend-level failure for storage-engine-backed caches.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
