//! Expiring in-process cache plus a single-flight M2M credential coordinator that attaches,
//! caches, and invalidates bearer tokens for outbound service clients.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
#[cfg(feature = "reqwest")] pub mod client;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
#[cfg(feature = "reqwest")] pub mod hook;
pub mod http;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use time::macros;
	// self
	use crate::{
		cache::{ExpiringCache, MemoryCache},
		clock::{Clock, ManualClock},
		config::CredentialConfig,
		credential::{CredentialCoordinator, TokenSecret},
		http::ReqwestHttpClient,
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "svc-orders";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "svc-orders-secret";
	/// Resource used by test fixtures.
	pub const TEST_RESOURCE: &str = "api://inventory";
	/// Scope used by test fixtures.
	pub const TEST_SCOPE: &str = "inventory.read";

	/// Coordinator type alias used by reqwest-backed integration tests.
	pub type ReqwestTestCoordinator = CredentialCoordinator<ReqwestHttpClient>;

	/// Builds a credential configuration pointing at the provided token endpoint.
	pub fn test_credential_config(token_url: &str) -> CredentialConfig {
		CredentialConfig {
			url: Url::parse(token_url).expect("Test token endpoint should parse successfully."),
			client_id: TEST_CLIENT_ID.into(),
			client_secret: TokenSecret::new(TEST_CLIENT_SECRET),
			resource: TEST_RESOURCE.into(),
			scope: TEST_SCOPE.into(),
			timeout: CredentialConfig::DEFAULT_TIMEOUT,
		}
	}

	/// Returns a manual clock pinned to a fixed instant.
	pub fn test_clock() -> ManualClock {
		ManualClock::new(macros::datetime!(2025-11-10 12:00 UTC))
	}

	/// Constructs a [`CredentialCoordinator`] backed by a fresh [`MemoryCache`] driven by a
	/// [`ManualClock`], so tests can move time explicitly.
	pub fn build_reqwest_test_coordinator(
		config: &CredentialConfig,
	) -> (ReqwestTestCoordinator, Arc<MemoryCache>, ManualClock) {
		let clock = test_clock();
		let cache_backend = Arc::new(MemoryCache::with_clock(Arc::new(clock.clone()) as Arc<dyn Clock>));
		let cache: Arc<dyn ExpiringCache> = cache_backend.clone();
		let coordinator =
			CredentialCoordinator::with_http_client(config, cache, ReqwestHttpClient::default())
				.expect("Test coordinator should build from a valid configuration.");

		(coordinator, cache_backend, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
