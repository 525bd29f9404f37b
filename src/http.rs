//! Transport primitives for signed upstream calls.
//!
//! The module exposes [`UpstreamHttpClient`] alongside the [`UpstreamRequest`] and
//! [`UpstreamResponse`] shapes so the forwarder never depends on a concrete HTTP stack.
//! [`ReqwestHttpClient`] is the default implementation.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::{Method, header::HeaderMap};
// self
use crate::{_prelude::*, oauth::SigningMethod};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Lower-cased header name to its values, in wire order.
///
/// Repeated headers such as `set-cookie` keep one entry per line.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Boxed future returned by [`UpstreamHttpClient::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<UpstreamResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing signed upstream calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every in-flight request, and the futures they return must be `Send` so forwards can be
/// spawned onto a multi-threaded runtime.
pub trait UpstreamHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves once the full response body has been read.
	///
	/// Any HTTP status, including 4xx and 5xx, is a successful transport outcome; only
	/// network-level failures resolve to `Err`.
	fn execute(&self, request: UpstreamRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Fully signed request ready to be sent upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamRequest {
	/// Verb used on the wire.
	pub method: SigningMethod,
	/// Absolute upstream URL including the query string.
	pub url: Url,
	/// Request headers, including `authorization`.
	pub headers: Headers,
	/// Optional request body.
	pub body: Option<String>,
}

/// Raw upstream response as seen by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Headers,
	/// Response body decoded as text.
	pub body: String,
}
impl UpstreamResponse {
	/// Whether the status is in the `2xx` range.
	pub fn is_success(&self) -> bool {
		(200..=299).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects follow reqwest's default policy; the final response is what gets relayed.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client whose requests give up after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl UpstreamHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: UpstreamRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let mut builder = self.0.request(reqwest_method(request.method), request.url);

			for (name, values) in &request.headers {
				for value in values {
					builder = builder.header(name.as_str(), value.as_str());
				}
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.text().await?;

			Ok(UpstreamResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: SigningMethod) -> Method {
	match method {
		SigningMethod::Get => Method::GET,
		SigningMethod::Post => Method::POST,
		SigningMethod::Put => Method::PUT,
		SigningMethod::Delete => Method::DELETE,
	}
}

/// Returns the first value of `name`, matching case-insensitively.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(key, _)| key.eq_ignore_ascii_case(name))
		.and_then(|(_, values)| values.first())
		.map(String::as_str)
}

/// Copies a header map, keeping every value of repeated headers and skipping non-text values.
#[cfg(feature = "reqwest")]
pub fn collect_headers(map: &HeaderMap) -> Headers {
	let mut headers = Headers::new();

	for (name, value) in map {
		let Ok(value) = value.to_str() else { continue };

		headers.entry(name.as_str().to_owned()).or_default().push(value.to_owned());
	}

	headers
}
