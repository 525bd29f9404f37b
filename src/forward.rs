//! Request forwarding: verb resolution, upstream URL construction, and signed execution.
//!
//! [`Forwarder::forward`] resolves the cached [`SigningContext`], signs an [`OutboundCall`]
//! built from the caller's [`InboundRequest`], and hands it to the configured
//! [`UpstreamHttpClient`]. [`Forwarder::spawn`] runs the same work as a cancellable
//! [`ForwardTask`] so a disconnecting caller tears down the upstream call with it.

mod metrics;

pub use metrics::ForwardMetrics;

// std
use std::task::{Context, Poll};
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::{AccountTokens, ConsumerCredentials},
	error::ConfigError,
	http::{Headers, UpstreamHttpClient, UpstreamResponse},
	oauth::{SigningContext, SigningContextCache, SigningMethod, TransportErrorMapper, signature},
	obs::{self, ForwardOutcome, ProxySpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Scheme and host every outbound call targets.
pub const UPSTREAM_BASE_URL: &str = "https://api.twitter.com";

#[cfg(feature = "reqwest")]
/// Forwarder specialized for the crate's default reqwest transport stack.
pub type ReqwestForwarder = Forwarder<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Read-only snapshot of the caller's request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundRequest {
	/// Verb exactly as received.
	pub method: String,
	/// Request path, starting with `/`.
	pub path: String,
	/// Decoded query pairs in their original order.
	pub query: Vec<(String, String)>,
}
impl InboundRequest {
	/// Creates a request without query parameters.
	pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
		Self { method: method.into(), path: path.into(), query: Vec::new() }
	}

	/// Creates a request from a raw, still-encoded query string.
	pub fn from_raw_query(
		method: impl Into<String>,
		path: impl Into<String>,
		raw_query: Option<&str>,
	) -> Self {
		let query = raw_query
			.map(|raw| {
				url::form_urlencoded::parse(raw.as_bytes())
					.map(|(k, v)| (k.into_owned(), v.into_owned()))
					.collect()
			})
			.unwrap_or_default();

		Self { method: method.into(), path: path.into(), query }
	}

	/// Appends a query pair.
	pub fn with_query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}
}

/// Fully resolved call ready to be signed and sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundCall {
	/// Absolute upstream URL.
	pub url: Url,
	/// Resolved signing operation.
	pub method: SigningMethod,
	/// Account the call is signed for.
	pub tokens: AccountTokens,
}

/// Mutually exclusive outcome of an upstream round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamResult {
	/// Upstream answered with a `2xx` status.
	Success {
		/// Raw response body.
		body: String,
		/// HTTP status code.
		status: u16,
		/// Response headers.
		headers: Headers,
	},
	/// Upstream answered with any other status.
	Failure {
		/// HTTP status code.
		status: u16,
		/// Raw error body as returned by the upstream.
		raw_body: String,
		/// Response headers.
		headers: Headers,
	},
}
impl UpstreamResult {
	/// Upstream status code on either side.
	pub fn status(&self) -> u16 {
		match self {
			Self::Success { status, .. } | Self::Failure { status, .. } => *status,
		}
	}

	/// Upstream headers on either side.
	pub fn headers(&self) -> &Headers {
		match self {
			Self::Success { headers, .. } | Self::Failure { headers, .. } => headers,
		}
	}

	/// Whether the upstream reported success.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}
}
impl From<UpstreamResponse> for UpstreamResult {
	fn from(response: UpstreamResponse) -> Self {
		let success = response.is_success();
		let UpstreamResponse { status, headers, body } = response;

		if success {
			Self::Success { body, status, headers }
		} else {
			Self::Failure { status, raw_body: body, headers }
		}
	}
}

/// Composes `base` + `path` with the query pairs serialized in order.
pub fn upstream_url(base: &Url, path: &str, query: &[(String, String)]) -> Url {
	let mut url = base.clone();

	url.set_path(path);

	if query.is_empty() {
		url.set_query(None);
	} else {
		url.set_query(Some(&signature::encode_query(query)));
	}

	url
}

/// Signs and forwards inbound requests on behalf of the configured account.
///
/// Cloning is cheap; clones share the transport, the signing-context cache, and the metrics.
pub struct Forwarder<C, M>
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Consumer credentials used to build the signing context.
	pub consumer: ConsumerCredentials,
	/// Account every call is signed for.
	pub tokens: AccountTokens,
	/// Scheme + host calls are sent to.
	pub base_url: Url,
	/// Shared counters for forward outcomes.
	pub metrics: Arc<ForwardMetrics>,
	contexts: Arc<SigningContextCache>,
}
impl<C, M> Forwarder<C, M>
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Creates a forwarder that reuses the caller-provided transport + mapper pair.
	///
	/// The forwarder draws its signing context from [`SigningContextCache::global`].
	pub fn with_http_client(
		consumer: ConsumerCredentials,
		tokens: AccountTokens,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			consumer,
			tokens,
			base_url: default_base_url(),
			metrics: Default::default(),
			contexts: SigningContextCache::global(),
		}
	}

	/// Points the forwarder at a different scheme + host.
	pub fn with_base_url(mut self, base: &str) -> Result<Self> {
		self.base_url = Url::parse(base).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Ok(self)
	}

	/// Replaces the signing-context cache.
	pub fn with_context_cache(mut self, contexts: Arc<SigningContextCache>) -> Self {
		self.contexts = contexts;

		self
	}

	/// Returns the shared signing context, building it on first use.
	pub fn signing_context(&self) -> Arc<SigningContext> {
		self.contexts.get_or_create(&self.consumer)
	}

	/// Forwards `inbound` with the cached signing context and the configured account.
	pub async fn forward(&self, inbound: &InboundRequest) -> Result<UpstreamResult> {
		let span = ProxySpan::new(&inbound.method, "forward");
		let label =
			SigningMethod::resolve(&inbound.method).map(SigningMethod::as_str).unwrap_or("UNKNOWN");

		obs::record_forward_outcome(label, ForwardOutcome::Attempt);
		self.metrics.record(ForwardOutcome::Attempt);

		let context = self.signing_context();
		let result = span.instrument(self.forward_with(&context, &self.tokens, inbound)).await;
		let outcome = match &result {
			Ok(upstream) if upstream.is_success() => ForwardOutcome::Success,
			Ok(_) => ForwardOutcome::UpstreamError,
			Err(_) => ForwardOutcome::Failure,
		};

		span.note(outcome.as_str());
		obs::record_forward_outcome(label, outcome);
		self.metrics.record(outcome);

		result
	}

	/// Forwards `inbound` with an explicit context and account.
	///
	/// Unknown verbs fail before any network call is made.
	pub async fn forward_with(
		&self,
		context: &SigningContext,
		tokens: &AccountTokens,
		inbound: &InboundRequest,
	) -> Result<UpstreamResult> {
		let method = SigningMethod::resolve(&inbound.method)?;
		let call = OutboundCall {
			url: upstream_url(&self.base_url, &inbound.path, &inbound.query),
			method,
			tokens: tokens.clone(),
		};
		let request = context.prepare(&call)?;
		let response = self
			.http_client
			.execute(request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(method, err))?;

		Ok(response.into())
	}

	/// Runs [`forward`](Self::forward) on the tokio runtime.
	///
	/// Must be called from within a tokio runtime.
	pub fn spawn(&self, inbound: InboundRequest) -> ForwardTask {
		let forwarder = self.clone();

		ForwardTask(tokio::spawn(async move { forwarder.forward(&inbound).await }))
	}
}
impl<C, M> Clone for Forwarder<C, M>
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			consumer: self.consumer.clone(),
			tokens: self.tokens.clone(),
			base_url: self.base_url.clone(),
			metrics: self.metrics.clone(),
			contexts: self.contexts.clone(),
		}
	}
}
impl<C, M> Debug for Forwarder<C, M>
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Forwarder")
			.field("consumer", &self.consumer)
			.field("tokens", &self.tokens)
			.field("base_url", &self.base_url.as_str())
			.finish()
	}
}

/// Handle to a spawned forward.
///
/// Awaiting the task yields the forward's result. Dropping it, or calling
/// [`cancel`](Self::cancel), aborts the upstream call.
#[derive(Debug)]
pub struct ForwardTask(JoinHandle<Result<UpstreamResult>>);
impl ForwardTask {
	/// Aborts the upstream call. Awaiting afterwards yields [`Error::Cancelled`].
	pub fn cancel(&self) {
		self.0.abort();
	}

	/// Whether the forward has completed, been cancelled, or panicked.
	pub fn is_finished(&self) -> bool {
		self.0.is_finished()
	}
}
impl Future for ForwardTask {
	type Output = Result<UpstreamResult>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.get_mut().0).poll(cx) {
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			Poll::Ready(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
			Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Cancelled)),
			Poll::Pending => Poll::Pending,
		}
	}
}
impl Drop for ForwardTask {
	fn drop(&mut self) {
		self.0.abort();
	}
}

fn default_base_url() -> Url {
	Url::parse(UPSTREAM_BASE_URL).expect("Upstream base URL constant must parse.")
}
