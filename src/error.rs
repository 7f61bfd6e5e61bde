//! Crate-level error types shared by the cache, the coordinator, and the outgoing client.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache-layer failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// An HTTP request could not complete (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The identity provider answered, but not with a usable token response.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// No valid credential could be obtained; the outbound request must not be sent.
	#[error("No credential is available: {reason}.")]
	MissingCredential {
		/// Coordinator-supplied reason string.
		reason: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed or joined.
	#[error("Configured {field} is not a valid URL.")]
	InvalidUrl {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required configuration field is empty.
	#[error("Configuration field `{field}` must not be empty.")]
	EmptyField {
		/// Offending field name.
		field: &'static str,
	},
	/// Token request body could not be encoded.
	#[error("Token request body could not be encoded.")]
	RequestEncoding(#[from] serde_json::Error),
	/// The credential request timeout must be non-zero.
	#[error("Credential request timeout must be greater than zero.")]
	ZeroTimeout,
	/// A default request header has an invalid name or value.
	#[error("Default request header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as configured.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending an HTTP request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within its configured timeout.
	#[error("HTTP request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// The identity provider rejected the request or answered with an unusable body.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Token endpoint answered with a status other than `200 OK`.
	#[error("Token endpoint returned unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Leading part of the response body, for diagnostics.
		body_preview: String,
	},
	/// Token endpoint responded with JSON that could not be decoded.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// The issued access token cannot be carried in an `Authorization` header.
	#[error("Token endpoint issued an access token that is not a valid header value.")]
	InvalidAccessToken,
}
