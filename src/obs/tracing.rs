// self
use crate::{_prelude::*, credential::CacheKey, obs::CredentialOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by coordinator operations.
#[derive(Clone, Debug)]
pub struct CredentialSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CredentialSpan {
	/// Creates a new span tagged with the operation and the coordinator's cache key.
	pub fn new(op: CredentialOp, cache_key: &CacheKey) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"m2m_auth.credential",
				op = op.as_str(),
				cache_key = cache_key.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, cache_key);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event inside the current span (when enabled).
pub(crate) fn debug_event(message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = message;
	}
}
