//! Optional observability helpers for forwarded requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `twitter_proxy.forward` with the `method`
//!   (inbound verb) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `twitter_proxy_forward_total` counter for every
//!   attempt/success/upstream error/failure, labeled by `method` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForwardOutcome {
	/// Entry to the forwarder.
	Attempt,
	/// Upstream answered with a `2xx` status.
	Success,
	/// Upstream answered with a non-`2xx` status.
	UpstreamError,
	/// The call never produced an upstream response.
	Failure,
}
impl ForwardOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ForwardOutcome::Attempt => "attempt",
			ForwardOutcome::Success => "success",
			ForwardOutcome::UpstreamError => "upstream_error",
			ForwardOutcome::Failure => "failure",
		}
	}
}
impl Display for ForwardOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
