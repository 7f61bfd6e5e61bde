// self
use crate::obs::{CredentialOp, CredentialOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(op: CredentialOp, outcome: CredentialOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"m2m_auth_credential_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}
