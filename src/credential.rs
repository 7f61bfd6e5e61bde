//! Credential coordinator with a lock-free fast path and single-flight refresh.
//!
//! A [`CredentialCoordinator`] owns one cache key derived from its client id, resource, and
//! scope. [`CredentialCoordinator::attach_credential`] first reads the shared cache without
//! taking any coordinator lock. On a miss it takes the coordinator's refresh lock, re-reads the
//! cache (another caller may have refreshed while this one waited), and only then calls the
//! identity provider. The token is cached for its declared lifetime minus
//! [`SAFETY_MARGIN`], so concurrent callers piggy-back on a single in-flight acquisition
//! instead of stampeding the token endpoint. Failures are never cached.

pub mod key;
pub mod secret;
pub mod target;

mod grant;
mod metrics;

pub use grant::IssuedToken;
pub use key::CacheKey;
pub use metrics::AcquisitionMetrics;
pub use secret::TokenSecret;
pub use target::BearerTarget;

// self
use crate::{
	_prelude::*,
	cache::{CacheError, ExpiringCache},
	config::CredentialConfig,
	credential::grant::TokenRequestBody,
	error::{ConfigError, ProtocolError},
	http::TokenHttpClient,
	obs::{self, CredentialOp, CredentialOutcome, CredentialSpan},
};
#[cfg(feature = "reqwest")] use crate::{cache::MemoryCache, http::ReqwestHttpClient};

/// Time subtracted from a token's declared lifetime before it is cached.
pub const SAFETY_MARGIN: Duration = Duration::seconds(300);

#[cfg(feature = "reqwest")]
/// Coordinator specialized for the crate's default reqwest transport.
pub type ReqwestCoordinator = CredentialCoordinator<ReqwestHttpClient>;

/// Obtains, caches, and invalidates the access token of one client credential.
///
/// Clones share the refresh lock, the metrics, and the cache, so a clone is the same logical
/// coordinator.
pub struct CredentialCoordinator<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client used for every token request.
	pub http_client: Arc<C>,
	/// Cache holding the token; usually shared with other coordinators.
	pub cache: Arc<dyn ExpiringCache>,
	cache_key: CacheKey,
	endpoint: Url,
	client_id: String,
	client_secret: TokenSecret,
	resource: String,
	scope: String,
	timeout: StdDuration,
	metrics: Arc<AcquisitionMetrics>,
	refresh_lock: Arc<AsyncMutex<()>>,
}
impl<C> CredentialCoordinator<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a coordinator that reuses the caller-provided cache and transport.
	pub fn with_http_client(
		config: &CredentialConfig,
		cache: Arc<dyn ExpiringCache>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		config.validate()?;

		Ok(Self {
			http_client: http_client.into(),
			cache,
			cache_key: CacheKey::derive(&config.client_id, &config.resource, &config.scope),
			endpoint: config.url.clone(),
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			resource: config.resource.clone(),
			scope: config.scope.clone(),
			timeout: config.timeout,
			metrics: Default::default(),
			refresh_lock: Arc::new(AsyncMutex::new(())),
		})
	}

	/// Key under which this coordinator stores its token.
	pub fn cache_key(&self) -> &CacheKey {
		&self.cache_key
	}

	/// Counters for cache hits, acquisitions, and invalidations.
	pub fn metrics(&self) -> &AcquisitionMetrics {
		&self.metrics
	}

	/// Sets `Authorization: Bearer <token>` on `request`, acquiring a token when needed.
	///
	/// On error the request is left untouched and must not be sent.
	pub async fn attach_credential<R>(&self, request: &mut R) -> Result<()>
	where
		R: ?Sized + BearerTarget,
	{
		let token = self.access_token().await?;

		request.set_bearer(&token)
	}

	/// Returns a valid access token, calling the identity provider at most once per expiry
	/// cycle across all concurrent callers.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		const OP: CredentialOp = CredentialOp::Attach;

		let span = CredentialSpan::new(OP, &self.cache_key);

		obs::record_outcome(OP, CredentialOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(token) = self.cached_token().await? {
					self.record_cache_hit();

					return Ok(token);
				}

				let _refresh = self.refresh_lock.lock().await;

				if let Some(token) = self.cached_token().await? {
					self.record_cache_hit();

					return Ok(token);
				}

				self.acquire().await
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, CredentialOutcome::Success),
			Err(_) => obs::record_outcome(OP, CredentialOutcome::Failure),
		}

		result
	}

	/// Drops the cached token so the next request acquires a new one.
	///
	/// Idempotent. Does not contact the identity provider.
	pub async fn invalidate(&self) -> Result<()> {
		const OP: CredentialOp = CredentialOp::Invalidate;

		let span = CredentialSpan::new(OP, &self.cache_key);

		obs::record_outcome(OP, CredentialOutcome::Attempt);
		self.metrics.record_invalidation();

		let result = span
			.instrument(async move {
				<dyn ExpiringCache>::delete(self.cache.as_ref(), self.cache_key.as_str()).await?;
				obs::debug_event("cached credential invalidated");

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, CredentialOutcome::Success),
			Err(_) => obs::record_outcome(OP, CredentialOutcome::Failure),
		}

		result
	}

	async fn cached_token(&self) -> Result<Option<TokenSecret>> {
		match <dyn ExpiringCache>::get_string(self.cache.as_ref(), self.cache_key.as_str()).await {
			Ok(token) => Ok(token.filter(|token| !token.is_empty()).map(TokenSecret::new)),
			// Someone else wrote a non-string under this key; the next acquisition replaces it.
			Err(CacheError::TypeMismatch { .. }) => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	fn record_cache_hit(&self) {
		self.metrics.record_cache_hit();
		obs::record_outcome(CredentialOp::Attach, CredentialOutcome::CacheHit);
	}

	// Callers must hold `refresh_lock`.
	async fn acquire(&self) -> Result<TokenSecret> {
		const OP: CredentialOp = CredentialOp::Acquire;

		obs::record_outcome(OP, CredentialOutcome::Attempt);
		self.metrics.record_attempt();

		let result: Result<IssuedToken> = async {
			let issued = self.request_token().await?;

			<dyn ExpiringCache>::set(
				self.cache.as_ref(),
				self.cache_key.as_str(),
				issued.access_token.expose().into(),
				Some(cache_ttl(issued.expires_in)),
			)
			.await?;

			Ok(issued)
		}
		.await;

		match result {
			Ok(issued) => {
				self.metrics.record_success();
				obs::record_outcome(OP, CredentialOutcome::Success);
				obs::debug_event("credential acquired from identity provider");

				Ok(issued.access_token)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_outcome(OP, CredentialOutcome::Failure);
				obs::debug_event("credential acquisition failed");

				Err(err)
			},
		}
	}

	async fn request_token(&self) -> Result<IssuedToken> {
		let body = serde_json::to_vec(&TokenRequestBody {
			client_id: &self.client_id,
			client_secret: self.client_secret.expose(),
			resource: &self.resource,
			scope: &self.scope,
		})
		.map_err(ConfigError::from)?;
		let response = self.http_client.post_json(&self.endpoint, body, self.timeout).await?;

		if response.status != 200 {
			return Err(ProtocolError::UnexpectedStatus {
				status: response.status,
				retry_after: response.retry_after,
				body_preview: grant::body_preview(&response.body),
			}
			.into());
		}

		grant::decode_token_response(response.status, &response.body)
	}
}
#[cfg(feature = "reqwest")]
impl CredentialCoordinator<ReqwestHttpClient> {
	/// Creates a coordinator backed by the process-wide [`MemoryCache::shared`] cache and a
	/// default reqwest transport.
	pub fn new(config: &CredentialConfig) -> Result<Self> {
		Self::with_cache(config, MemoryCache::shared())
	}

	/// Creates a coordinator backed by `cache` and a default reqwest transport.
	pub fn with_cache(config: &CredentialConfig, cache: Arc<dyn ExpiringCache>) -> Result<Self> {
		Self::with_http_client(config, cache, ReqwestHttpClient::default())
	}
}
impl<C> Clone for CredentialCoordinator<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			cache: self.cache.clone(),
			cache_key: self.cache_key.clone(),
			endpoint: self.endpoint.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			resource: self.resource.clone(),
			scope: self.scope.clone(),
			timeout: self.timeout,
			metrics: self.metrics.clone(),
			refresh_lock: self.refresh_lock.clone(),
		}
	}
}
impl<C> Debug for CredentialCoordinator<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCoordinator")
			.field("endpoint", &self.endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("resource", &self.resource)
			.field("scope", &self.scope)
			.field("cache_key", &self.cache_key)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.finish()
	}
}

/// TTL for a token the provider declared valid for `lifetime`.
///
/// Lifetimes at or below [`SAFETY_MARGIN`] produce a negative TTL, so the token is already
/// expired on the next read.
fn cache_ttl(lifetime: Duration) -> Duration {
	let ttl = lifetime.saturating_sub(SAFETY_MARGIN);

	// The cache reads a zero TTL as "never expires".
	if ttl.is_positive() { ttl } else { ttl.min(-Duration::SECOND) }
}
