//! Cache keys derived from a credential configuration.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Cache key owned by exactly one credential configuration.
///
/// The key is `m2m:` followed by a base64 (URL-safe, no padding) SHA-256 digest over the
/// length-prefixed client id, resource, and scope. Length prefixes keep tuples such as
/// `("a_b", "c")` and `("a", "b_c")` apart.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);
impl CacheKey {
	const PREFIX: &'static str = "m2m:";

	/// Derives the key for the `(client_id, resource, scope)` tuple.
	pub fn derive(client_id: &str, resource: &str, scope: &str) -> Self {
		let mut hasher = Sha256::new();

		for part in [client_id, resource, scope] {
			hasher.update((part.len() as u64).to_be_bytes());
			hasher.update(part.as_bytes());
		}

		let digest = hasher.finalize();

		Self(format!("{}{}", Self::PREFIX, URL_SAFE_NO_PAD.encode(digest)))
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CacheKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CacheKey({})", self.0)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
