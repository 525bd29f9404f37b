// self
use crate::obs::ForwardOutcome;

/// Records a forward outcome via the global metrics recorder (when enabled).
///
/// `method` should be a bounded label such as [`SigningMethod::as_str`] or `"UNKNOWN"`, never
/// the raw inbound verb.
///
/// [`SigningMethod::as_str`]: crate::oauth::SigningMethod::as_str
pub fn record_forward_outcome(method: &'static str, outcome: ForwardOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"twitter_proxy_forward_total",
			"method" => method,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_forward_outcome_noop_without_metrics() {
		record_forward_outcome("GET", ForwardOutcome::Failure);
	}
}
