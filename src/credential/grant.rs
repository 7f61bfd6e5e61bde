//! Wire format of the identity provider's token endpoint.

// self
use crate::{_prelude::*, credential::TokenSecret, error::ProtocolError};

const BODY_PREVIEW_LEN: usize = 256;

/// JSON body posted to the token endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequestBody<'a> {
	pub(crate) client_id: &'a str,
	pub(crate) client_secret: &'a str,
	pub(crate) resource: &'a str,
	pub(crate) scope: &'a str,
}

#[derive(Deserialize)]
struct TokenResponseBody {
	access_token: String,
	#[serde(default)]
	token_type: String,
	expires_in: i64,
}

/// Token issued by the identity provider.
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Bearer access token.
	pub access_token: TokenSecret,
	/// Token type as reported by the provider (usually `Bearer`).
	pub token_type: String,
	/// Lifetime declared by the provider.
	pub expires_in: Duration,
}

/// Decodes a `200 OK` token response body.
pub(crate) fn decode_token_response(status: u16, body: &[u8]) -> Result<IssuedToken> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let parsed: TokenResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProtocolError::MalformedResponse { source, status })?;

	if parsed.access_token.is_empty() {
		return Err(Error::MissingCredential {
			reason: "token endpoint returned an empty access_token".into(),
		});
	}
	if !parsed.access_token.bytes().all(|b| b.is_ascii_graphic()) {
		return Err(ProtocolError::InvalidAccessToken.into());
	}

	Ok(IssuedToken {
		access_token: TokenSecret::new(parsed.access_token),
		token_type: parsed.token_type,
		expires_in: Duration::seconds(parsed.expires_in),
	})
}

/// Returns a bounded, lossy UTF-8 preview of an error body.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	text.chars().take(BODY_PREVIEW_LEN).collect()
}
