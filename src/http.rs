//! Transport primitives for token requests.
//!
//! [`TokenHttpClient`] is the coordinator's only dependency on an HTTP stack. The default
//! [`ReqwestHttpClient`] posts JSON with a per-request timeout and captures the status,
//! `Retry-After` hint, and body so the coordinator can classify the outcome.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`TokenHttpClient::post_json`].
pub type TokenHttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenHttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to post a token request.
///
/// Implementations must enforce `timeout` for the whole exchange and report it as
/// [`TransportError::Timeout`]. Any HTTP status, including errors, is a successful transport
/// outcome and must be returned as a [`TokenHttpResponse`].
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Posts `body` as `application/json` to `url`.
	fn post_json<'a>(
		&'a self,
		url: &'a Url,
		body: Vec<u8>,
		timeout: StdDuration,
	) -> TokenHttpFuture<'a>;
}

/// Status, retry hint, and body of a token endpoint response.
#[derive(Clone, Debug, Default)]
pub struct TokenHttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_json<'a>(
		&'a self,
		url: &'a Url,
		body: Vec<u8>,
		timeout: StdDuration,
	) -> TokenHttpFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(url.clone())
				.header(CONTENT_TYPE, "application/json")
				.header(ACCEPT, "application/json")
				.timeout(timeout)
				.body(body)
				.send()
				.await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(TokenHttpResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
