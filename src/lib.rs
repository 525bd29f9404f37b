//! Single-account OAuth 1.0a signing reverse proxy for the Twitter REST API.
//!
//! Inbound requests are forwarded to `https://api.twitter.com` with the same path and query,
//! signed with one configured consumer key and access token, and the upstream status, headers
//! and body are reconciled into the caller's response.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod reconcile;
#[cfg(feature = "server")] pub mod server;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AccountTokens, ConsumerCredentials},
		error::TransportError,
		forward::Forwarder,
		http::{Headers, TransportFuture, UpstreamHttpClient, UpstreamRequest, UpstreamResponse},
		oauth::PassthroughTransportErrorMapper,
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		forward::ReqwestForwarder, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper,
	};

	/// Forwarder type alias used by tests that swap in [`RecordingHttpClient`].
	pub type RecordingForwarder = Forwarder<RecordingHttpClient, PassthroughTransportErrorMapper>;

	/// Consumer credentials shared by unit and integration tests.
	pub fn test_consumer() -> ConsumerCredentials {
		ConsumerCredentials::new("test-consumer-key", "test-consumer-secret")
	}

	/// Account tokens shared by unit and integration tests.
	pub fn test_tokens() -> AccountTokens {
		AccountTokens::new("test-access-token", "test-access-secret")
	}

	/// In-process [`UpstreamHttpClient`] that records every request and replies with a canned
	/// response (or a canned transport failure).
	#[derive(Clone, Debug)]
	pub struct RecordingHttpClient {
		requests: Arc<Mutex<Vec<UpstreamRequest>>>,
		reply: Arc<Mutex<Option<UpstreamResponse>>>,
	}
	impl RecordingHttpClient {
		/// Replies to every request with `status` and `body`.
		pub fn replying(status: u16, body: impl Into<String>) -> Self {
			Self::replying_with_headers(status, Headers::new(), body)
		}

		/// Replies to every request with `status`, `headers` and `body`.
		pub fn replying_with_headers(
			status: u16,
			headers: Headers,
			body: impl Into<String>,
		) -> Self {
			let reply = UpstreamResponse { status, headers, body: body.into() };

			Self { requests: Default::default(), reply: Arc::new(Mutex::new(Some(reply))) }
		}

		/// Fails every request with a connection reset.
		pub fn failing() -> Self {
			Self { requests: Default::default(), reply: Default::default() }
		}

		/// Requests observed so far.
		pub fn recorded(&self) -> Vec<UpstreamRequest> {
			self.requests.lock().clone()
		}
	}
	impl UpstreamHttpClient for RecordingHttpClient {
		type TransportError = TransportError;

		fn execute(&self, request: UpstreamRequest) -> TransportFuture<'_, Self::TransportError> {
			self.requests.lock().push(request);

			let reply = self.reply.lock().clone();

			Box::pin(async move {
				reply.ok_or_else(|| {
					TransportError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
				})
			})
		}
	}

	/// Builds a forwarder whose requests land in the returned [`RecordingHttpClient`].
	pub fn build_recording_forwarder(
		client: RecordingHttpClient,
	) -> (RecordingForwarder, RecordingHttpClient) {
		let forwarder: RecordingForwarder = Forwarder::with_http_client(
			test_consumer(),
			test_tokens(),
			client.clone(),
			PassthroughTransportErrorMapper,
		);

		(forwarder, client)
	}

	/// Builds a reqwest-backed forwarder that sends every call to `base_url` (usually an
	/// `httpmock` server) instead of the real upstream.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_forwarder(base_url: &str) -> ReqwestForwarder {
		let http_client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(5))
			.expect("Failed to build Reqwest client for tests.");
		let forwarder: ReqwestForwarder = Forwarder::with_http_client(
			test_consumer(),
			test_tokens(),
			http_client,
			ReqwestTransportErrorMapper,
		);

		forwarder.with_base_url(base_url).expect("Mock server base URL should parse.")
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{Arc, OnceLock},
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, twitter_proxy as _};
