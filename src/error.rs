//! Proxy-level error types shared across signing, forwarding, and configuration.

// self
use crate::_prelude::*;

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical proxy error exposed by public APIs.
///
/// Upstream HTTP errors (4xx/5xx from the API) are not represented here; they travel as
/// [`UpstreamResult::Failure`](crate::forward::UpstreamResult::Failure) so their status and
/// body reach the caller unchanged.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Spawned forward was aborted before it completed.
	#[error("Forward was cancelled before the upstream answered.")]
	Cancelled,
	/// Inbound verb has no matching signing operation.
	#[error("Unknown method `{method}`.")]
	UnknownMethod {
		/// Verb as received from the caller.
		method: String,
	},
}
impl Error {
	/// HTTP status surfaced to the caller when this error terminates a request.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Config(_) => 500,
			Self::Transport(TransportError::Timeout { .. }) => 504,
			Self::Transport(_) => 502,
			Self::Cancelled => 503,
			Self::UnknownMethod { .. } => 405,
		}
	}
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Config file could not be read.
	#[error("Config file `{path}` could not be read.")]
	Read {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Config file is not valid JSON or has the wrong shape.
	#[error("Config file `{path}` is malformed.")]
	Parse {
		/// Path that failed to parse.
		path: String,
		/// Structured parsing failure pointing at the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A required credential is empty.
	#[error("Config field `{field}` must not be empty.")]
	MissingField {
		/// camelCase name of the field.
		field: &'static str,
	},
	/// Upstream base URL cannot be parsed.
	#[error("Upstream base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HMAC key could not be initialized from the configured secrets.
	#[error("Signing key could not be initialized.")]
	SigningKey,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Upstream did not answer within the configured timeout.
	#[error("Timed out while calling the upstream API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
