//! Outbound service client that runs [`RequestHook`]s around every request.

// crates.io
use reqwest::{
	Method, Request, RequestBuilder, Response, StatusCode,
	header::{HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	config::OutgoingServiceConfig,
	credential::CredentialCoordinator,
	error::{ConfigError, TransportError},
	hook::{CredentialHook, RequestHook},
	http::TokenHttpClient,
};

/// HTTP client for one outbound service.
///
/// Requests are resolved against the configured host, carry the configured default headers,
/// and are bounded by the configured timeout. Hooks run in registration order.
#[derive(Clone)]
pub struct OutgoingClient {
	name: String,
	base_url: Url,
	http_client: ReqwestClient,
	hooks: Vec<Arc<dyn RequestHook>>,
}
impl OutgoingClient {
	/// Builds a client from `config` with no hooks.
	pub fn new(config: &OutgoingServiceConfig) -> Result<Self> {
		let mut headers = HeaderMap::new();

		for pair in &config.default_request_headers {
			let invalid = || ConfigError::InvalidHeader { name: pair.key.clone() };
			let name = HeaderName::from_bytes(pair.key.as_bytes()).map_err(|_| invalid())?;
			let value = HeaderValue::from_str(&pair.value).map_err(|_| invalid())?;

			headers.append(name, value);
		}

		let mut builder = ReqwestClient::builder().default_headers(headers);

		if !config.timeout.is_zero() {
			builder = builder.timeout(config.timeout);
		}

		Ok(Self {
			name: config.name.clone(),
			base_url: config.host.clone(),
			http_client: builder.build().map_err(ConfigError::from)?,
			hooks: Vec::new(),
		})
	}

	/// Appends `hook` to the pipeline.
	pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
		self.hooks.push(hook);

		self
	}

	/// Authenticates every request through `coordinator`.
	pub fn with_credential<C>(self, coordinator: CredentialCoordinator<C>) -> Self
	where
		C: ?Sized + TokenHttpClient,
	{
		self.with_hook(Arc::new(CredentialHook::new(coordinator)))
	}

	/// Logical service name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Starts a request for `path` relative to the configured host.
	pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
		let url = self
			.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidUrl { field: "path", source })?;

		Ok(self.http_client.request(method, url))
	}

	/// Runs the hooks around sending `request` and returns the response.
	///
	/// A failing before-send hook aborts the call; nothing is sent.
	pub async fn execute(&self, mut request: Request) -> Result<Response> {
		for hook in &self.hooks {
			hook.before_send(&mut request).await?;
		}

		let response = self.http_client.execute(request).await.map_err(TransportError::from)?;
		let status = response.status();

		for hook in &self.hooks {
			hook.after_receive(status, response.headers()).await?;
		}

		Ok(response)
	}

	/// Like [`execute`](Self::execute), also reading the body.
	pub async fn execute_bytes(&self, request: Request) -> Result<(StatusCode, Vec<u8>)> {
		let response = self.execute(request).await?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		Ok((status, body.to_vec()))
	}
}
impl Debug for OutgoingClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OutgoingClient")
			.field("name", &self.name)
			.field("base_url", &self.base_url.as_str())
			.field("hooks", &self.hooks.len())
			.finish()
	}
}
