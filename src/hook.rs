//! Two-phase request hooks run by [`OutgoingClient`](crate::client::OutgoingClient).
//!
//! A hook sees every request before it is sent and the status and headers of every response.
//! [`CredentialHook`] uses this to attach a coordinator's bearer token and to drop the cached
//! token when a response comes back `401 Unauthorized`. Hooks never retry; retry policy belongs
//! to the caller.

// crates.io
use reqwest::{Request, StatusCode, header::HeaderMap};
// self
use crate::{_prelude::*, credential::CredentialCoordinator, http::TokenHttpClient, obs};

/// Boxed future returned by [`RequestHook`] phases.
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Pre-request / post-response hook.
pub trait RequestHook
where
	Self: Send + Sync,
{
	/// Runs before `request` is sent; an error aborts the request.
	fn before_send<'a>(&'a self, request: &'a mut Request) -> HookFuture<'a>;

	/// Runs after a response arrives.
	fn after_receive<'a>(&'a self, status: StatusCode, headers: &'a HeaderMap) -> HookFuture<'a>;
}

/// Hook that authenticates requests through a [`CredentialCoordinator`].
pub struct CredentialHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	coordinator: CredentialCoordinator<C>,
}
impl<C> CredentialHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps `coordinator`.
	pub fn new(coordinator: CredentialCoordinator<C>) -> Self {
		Self { coordinator }
	}

	/// Returns the wrapped coordinator.
	pub fn coordinator(&self) -> &CredentialCoordinator<C> {
		&self.coordinator
	}
}
impl<C> RequestHook for CredentialHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn before_send<'a>(&'a self, request: &'a mut Request) -> HookFuture<'a> {
		Box::pin(async move {
			if let Err(err) = self.coordinator.attach_credential(request).await {
				// The acquisition error is the one reported.
				if self.coordinator.invalidate().await.is_err() {
					obs::debug_event("invalidation after a failed attach also failed");
				}

				return Err(err);
			}

			Ok(())
		})
	}

	fn after_receive<'a>(&'a self, status: StatusCode, _headers: &'a HeaderMap) -> HookFuture<'a> {
		Box::pin(async move {
			if status == StatusCode::UNAUTHORIZED {
				self.coordinator.invalidate().await?;
			}

			Ok(())
		})
	}
}
impl<C> Debug for CredentialHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialHook").field("coordinator", &self.coordinator).finish()
	}
}
