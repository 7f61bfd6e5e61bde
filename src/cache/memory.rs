//! Thread-safe in-memory [`ExpiringCache`] implementation.

// std
use std::sync::LazyLock;
// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheValue, ExpiringCache},
	clock::{Clock, SystemClock},
};

type EntryMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

static SHARED: LazyLock<Arc<MemoryCache>> = LazyLock::new(|| Arc::new(MemoryCache::default()));

#[derive(Clone, Debug)]
struct CacheEntry {
	value: CacheValue,
	expires_at: Option<OffsetDateTime>,
}
impl CacheEntry {
	fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| now >= expires_at)
	}
}

/// Process-local cache guarded by a single read/write lock.
///
/// Reads share the lock; writes, deletes, and the removal of an entry found expired on read
/// take it exclusively.
#[derive(Clone)]
pub struct MemoryCache {
	entries: EntryMap,
	clock: Arc<dyn Clock>,
}
impl MemoryCache {
	/// Creates an empty cache that evaluates expiry with `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { entries: Default::default(), clock }
	}

	/// Returns the lazily created process-wide cache.
	///
	/// Coordinators built without an explicit cache share this instance. Tests should prefer
	/// their own instance.
	pub fn shared() -> Arc<MemoryCache> {
		SHARED.clone()
	}

	/// Number of physically stored entries, including expired ones not yet read.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	fn set_now(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
		let now = self.clock.now();
		// Out-of-range deadlines saturate: far past is "now", far future is "never".
		let expires_at = match ttl.filter(|ttl| !ttl.is_zero()) {
			Some(ttl) => match now.checked_add(ttl) {
				Some(at) => Some(at),
				None if ttl.is_negative() => Some(now),
				None => None,
			},
			None => None,
		};

		self.entries.write().insert(key.to_owned(), CacheEntry { value, expires_at });
	}

	fn get_now(&self, key: &str) -> Option<CacheValue> {
		let now = self.clock.now();

		{
			let guard = self.entries.read();
			let entry = guard.get(key)?;

			if !entry.is_expired_at(now) {
				return Some(entry.value.clone());
			}
		}

		let mut guard = self.entries.write();

		// Another writer may have replaced the entry between the two locks.
		if guard.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
			guard.remove(key);
		}

		None
	}

	fn delete_now(&self, key: &str) {
		self.entries.write().remove(key);
	}
}
impl Default for MemoryCache {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl Debug for MemoryCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryCache").field("entries", &self.len()).finish()
	}
}
impl ExpiringCache for MemoryCache {
	fn set<'a>(
		&'a self,
		key: &'a str,
		value: CacheValue,
		ttl: Option<Duration>,
	) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.set_now(key, value, ttl);

			Ok(())
		})
	}

	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheValue>> {
		Box::pin(async move { Ok(self.get_now(key)) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.delete_now(key);

			Ok(())
		})
	}
}
