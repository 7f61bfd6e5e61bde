//! Configuration types consumed by coordinators and outgoing clients.
//!
//! Both types deserialize from PascalCase keys (`Url`, `ClientId`, `Host`, `Timeout`, …) with
//! timeouts expressed in whole seconds. Loading them from files or the environment is left to
//! the embedding service.

// self
use crate::{_prelude::*, credential::TokenSecret, error::ConfigError};

/// Settings for one identity-provider credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialConfig {
	/// Token endpoint of the identity provider.
	pub url: Url,
	/// Client identifier presented to the provider.
	pub client_id: String,
	/// Client secret presented to the provider.
	pub client_secret: TokenSecret,
	/// Resource (audience) the token is requested for.
	#[serde(default)]
	pub resource: String,
	/// Scope requested for the token.
	#[serde(default)]
	pub scope: String,
	/// Upper bound for a single token request.
	#[serde(default = "CredentialConfig::default_timeout", with = "seconds")]
	pub timeout: StdDuration,
}
impl CredentialConfig {
	/// Timeout applied when the configuration does not specify one.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	fn default_timeout() -> StdDuration {
		Self::DEFAULT_TIMEOUT
	}

	/// Checks the settings a coordinator cannot work without.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.is_empty() {
			return Err(ConfigError::EmptyField { field: "client_id" });
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(())
	}
}

/// Settings for an outbound service client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutgoingServiceConfig {
	/// Logical service name, used in logs.
	pub name: String,
	/// Base URL that request paths are joined onto.
	pub host: Url,
	/// Per-request timeout; zero disables it.
	#[serde(default, with = "seconds")]
	pub timeout: StdDuration,
	/// Headers added to every request.
	#[serde(default)]
	pub default_request_headers: Vec<HeaderPair>,
}

/// A single configured header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeaderPair {
	/// Header name.
	pub key: String,
	/// Header value.
	pub value: String,
}

mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &StdDuration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(value.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(StdDuration::from_secs)
	}
}
