// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedForward<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedForward<F> = F;

/// A span builder used by the forwarder.
#[derive(Clone, Debug)]
pub struct ProxySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ProxySpan {
	/// Creates a new span tagged with the inbound verb + stage.
	pub fn new(method: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("twitter_proxy.forward", method, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, stage);

			Self {}
		}
	}

	/// Emits a debug event inside the span.
	pub fn note(&self, message: &str) {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(|| tracing::debug!("{message}"));
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = message;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedForward<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn proxy_span_noop_without_subscriber() {
		let span = ProxySpan::new("GET", "test");

		span.note("no subscriber installed");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = ProxySpan::new("POST", "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
