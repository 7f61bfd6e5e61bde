//! Destinations a bearer credential can be attached to.

// self
use crate::{_prelude::*, credential::TokenSecret};

/// Something that can carry an `Authorization: Bearer <token>` header.
///
/// Implemented for reqwest requests and header maps; other HTTP stacks can implement it
/// for their own request types.
pub trait BearerTarget {
	/// Sets the `Authorization` header, replacing any existing value.
	fn set_bearer(&mut self, token: &TokenSecret) -> Result<()>;
}

#[cfg(feature = "reqwest")]
mod reqwest_impls {
	// crates.io
	use reqwest::{
		Request,
		header::{AUTHORIZATION, HeaderMap, HeaderValue},
	};
	// self
	use super::*;
	use crate::error::ProtocolError;

	impl BearerTarget for HeaderMap {
		fn set_bearer(&mut self, token: &TokenSecret) -> Result<()> {
			let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
				.map_err(|_| ProtocolError::InvalidAccessToken)?;

			value.set_sensitive(true);
			self.insert(AUTHORIZATION, value);

			Ok(())
		}
	}

	impl BearerTarget for Request {
		fn set_bearer(&mut self, token: &TokenSecret) -> Result<()> {
			self.headers_mut().set_bearer(token)
		}
	}

}
