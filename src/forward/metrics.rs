// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::ForwardOutcome;

/// Thread-safe counters for forward attempts and their outcomes.
#[derive(Debug, Default)]
pub struct ForwardMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	upstream_error: AtomicU64,
	failure: AtomicU64,
}
impl ForwardMetrics {
	/// Returns the total number of forward attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of forwards the upstream answered with `2xx`.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of forwards the upstream answered with any other status.
	pub fn upstream_errors(&self) -> u64 {
		self.upstream_error.load(Ordering::Relaxed)
	}

	/// Returns the number of forwards that never produced an upstream response.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: ForwardOutcome) {
		let counter = match outcome {
			ForwardOutcome::Attempt => &self.attempts,
			ForwardOutcome::Success => &self.success,
			ForwardOutcome::UpstreamError => &self.upstream_error,
			ForwardOutcome::Failure => &self.failure,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
