//! Signing context management, verb resolution, and transport error mapping.
//!
//! A [`SigningContext`] binds the consumer credentials to the upstream's fixed OAuth 1.0a
//! parameters. The proxy only ever serves one account, so the context is built once per
//! [`SigningContextCache`] and then shared read-only by every in-flight request.

pub mod signature;

// self
use crate::{
	_prelude::*,
	auth::{AccountTokens, ConsumerCredentials},
	error::{ConfigError, TransportError},
	forward::OutboundCall,
	http::{Headers, UpstreamRequest},
};

/// Request-token endpoint bound into every signing context.
pub const REQUEST_TOKEN_URL: &str = "https://api.twitter.com/oauth/request_token";
/// Access-token endpoint bound into every signing context.
pub const ACCESS_TOKEN_URL: &str = "https://api.twitter.com/oauth/access_token";
/// Protocol version advertised in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0A";
/// Signature method advertised in `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Maps HTTP transport failures into proxy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a proxy error.
	fn map_transport_error(&self, method: SigningMethod, error: E) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, _method: SigningMethod, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::http_client_build(err).into();
		}

		TransportError::from(err).into()
	}
}

/// Mapper for transports that already speak [`TransportError`].
#[derive(Clone, Debug, Default)]
pub struct PassthroughTransportErrorMapper;
impl TransportErrorMapper<TransportError> for PassthroughTransportErrorMapper {
	fn map_transport_error(&self, _method: SigningMethod, err: TransportError) -> Error {
		err.into()
	}
}

/// Signing operations the context knows how to perform.
///
/// Each variant maps one-to-one onto an HTTP verb; every other verb resolves to
/// [`Error::UnknownMethod`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigningMethod {
	/// `GET` requests.
	Get,
	/// `POST` requests.
	Post,
	/// `PUT` requests.
	Put,
	/// `DELETE` requests.
	Delete,
}
impl SigningMethod {
	/// Resolves an inbound verb, case-insensitively.
	pub fn resolve(verb: &str) -> Result<Self> {
		match verb.to_ascii_lowercase().as_str() {
			"get" => Ok(Self::Get),
			"post" => Ok(Self::Post),
			"put" => Ok(Self::Put),
			"delete" => Ok(Self::Delete),
			_ => Err(Error::UnknownMethod { method: verb.to_owned() }),
		}
	}

	/// Upper-case verb used on the wire and in the signature base string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}

	/// Whether the verb carries an (empty) form body upstream.
	pub const fn has_body(self) -> bool {
		matches!(self, Self::Post | Self::Put)
	}
}
impl Display for SigningMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cryptographic parameters needed to sign requests for the configured consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningContext {
	/// Request-token endpoint.
	pub request_token_url: &'static str,
	/// Access-token endpoint.
	pub access_token_url: &'static str,
	/// Consumer credentials used for every signature.
	pub consumer: ConsumerCredentials,
	/// Value of `oauth_version`.
	pub version: &'static str,
	/// Value of `oauth_signature_method`.
	pub signature_method: &'static str,
}
impl SigningContext {
	/// Binds `consumer` to the upstream's fixed endpoints and protocol parameters.
	pub fn new(consumer: ConsumerCredentials) -> Self {
		Self {
			request_token_url: REQUEST_TOKEN_URL,
			access_token_url: ACCESS_TOKEN_URL,
			consumer,
			version: OAUTH_VERSION,
			signature_method: SIGNATURE_METHOD,
		}
	}

	/// Turns a resolved call into a signed upstream request.
	pub fn prepare(&self, call: &OutboundCall) -> Result<UpstreamRequest> {
		let mut headers = Headers::new();

		headers.insert(
			"authorization".into(),
			vec![self.authorization_header(call.method, &call.url, &call.tokens)?],
		);
		headers.insert("accept".into(), vec!["*/*".into()]);

		let body = if call.method.has_body() {
			headers.insert("content-type".into(), vec![FORM_CONTENT_TYPE.into()]);

			Some(String::new())
		} else {
			None
		};

		Ok(UpstreamRequest { method: call.method, url: call.url.clone(), headers, body })
	}

	/// Builds the `Authorization` header with a fresh nonce and the current timestamp.
	pub fn authorization_header(
		&self,
		method: SigningMethod,
		url: &Url,
		tokens: &AccountTokens,
	) -> Result<String> {
		self.authorization_header_at(
			method,
			url,
			tokens,
			&signature::nonce(),
			OffsetDateTime::now_utc().unix_timestamp(),
		)
	}

	/// Builds the `Authorization` header for a fixed nonce and timestamp.
	pub fn authorization_header_at(
		&self,
		method: SigningMethod,
		url: &Url,
		tokens: &AccountTokens,
		nonce: &str,
		timestamp: i64,
	) -> Result<String> {
		let mut oauth_params = vec![
			("oauth_consumer_key".to_owned(), self.consumer.consumer_key.clone()),
			("oauth_nonce".to_owned(), nonce.to_owned()),
			("oauth_signature_method".to_owned(), self.signature_method.to_owned()),
			("oauth_timestamp".to_owned(), timestamp.to_string()),
			("oauth_token".to_owned(), tokens.access_token.clone()),
			("oauth_version".to_owned(), self.version.to_owned()),
		];
		let mut signed_params = oauth_params.clone();

		signed_params.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));

		let base = signature::signature_base_string(method.as_str(), url, &signed_params);
		let signature = signature::sign(
			&base,
			self.consumer.consumer_secret.expose(),
			tokens.access_token_secret.expose(),
		)?;

		oauth_params.push(("oauth_signature".to_owned(), signature));

		Ok(signature::authorization_header(&oauth_params))
	}
}

/// One-time cache holding the shared [`SigningContext`].
///
/// The first [`get_or_create`](Self::get_or_create) call constructs the context; later calls
/// return it unchanged and ignore their credentials argument.
#[derive(Debug, Default)]
pub struct SigningContextCache(OnceLock<Arc<SigningContext>>);
impl SigningContextCache {
	/// Creates an empty cache.
	pub const fn new() -> Self {
		Self(OnceLock::new())
	}

	/// Process-wide cache shared by every forwarder that does not inject its own.
	pub fn global() -> Arc<Self> {
		static GLOBAL: OnceLock<Arc<SigningContextCache>> = OnceLock::new();

		GLOBAL.get_or_init(Default::default).clone()
	}

	/// Returns the cached context, building it from `consumer` on first use.
	pub fn get_or_create(&self, consumer: &ConsumerCredentials) -> Arc<SigningContext> {
		self.0.get_or_init(|| Arc::new(SigningContext::new(consumer.clone()))).clone()
	}

	/// Returns the cached context without building one.
	pub fn get(&self) -> Option<Arc<SigningContext>> {
		self.0.get().cloned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{test_consumer, test_tokens},
		http::header_value,
	};

	#[test]
	fn verbs_resolve_case_insensitively() {
		for (verb, expected) in [
			("GET", SigningMethod::Get),
			("post", SigningMethod::Post),
			("Put", SigningMethod::Put),
			("DELETE", SigningMethod::Delete),
		] {
			assert_eq!(SigningMethod::resolve(verb).expect("Verb should resolve."), expected);
		}

		for verb in ["PATCH", "HEAD", "OPTIONS", ""] {
			let err = SigningMethod::resolve(verb).expect_err("Verb should be rejected.");

			assert!(matches!(err, Error::UnknownMethod { ref method } if method == verb));
		}
	}

	#[test]
	fn cache_builds_context_once() {
		let cache = SigningContextCache::new();

		assert!(cache.get().is_none());

		let first = cache.get_or_create(&test_consumer());
		let second = cache.get_or_create(&ConsumerCredentials::new("other", "other-secret"));

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(second.consumer, test_consumer());
		assert_eq!(first.request_token_url, "https://api.twitter.com/oauth/request_token");
		assert_eq!(first.access_token_url, "https://api.twitter.com/oauth/access_token");
		assert_eq!(first.version, "1.0A");
		assert_eq!(first.signature_method, "HMAC-SHA1");
	}

	#[test]
	fn repeated_construction_is_indistinguishable() {
		let once = SigningContextCache::new().get_or_create(&test_consumer());
		let cache = SigningContextCache::new();
		let mut last = cache.get_or_create(&test_consumer());

		for _ in 0..8 {
			last = cache.get_or_create(&test_consumer());
		}

		assert_eq!(*once, *last);
	}

	#[test]
	fn global_cache_is_shared() {
		assert!(Arc::ptr_eq(&SigningContextCache::global(), &SigningContextCache::global()));
	}

	#[test]
	fn header_carries_protocol_parameters() {
		let context = SigningContext::new(test_consumer());
		let url = Url::parse("https://api.twitter.com/1.1/statuses/show.json?id=123")
			.expect("Failed to parse test URL.");
		let header = context
			.authorization_header_at(SigningMethod::Get, &url, &test_tokens(), "abc", 1_700_000_000)
			.expect("Signing should succeed.");

		assert!(header.starts_with("OAuth oauth_consumer_key=\"test-consumer-key\","));
		assert!(header.contains("oauth_nonce=\"abc\""));
		assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
		assert!(header.contains("oauth_timestamp=\"1700000000\""));
		assert!(header.contains("oauth_token=\"test-access-token\""));
		assert!(header.contains("oauth_version=\"1.0A\""));
		assert!(header.contains("oauth_signature=\""));
		assert!(!header.contains("test-access-secret"));

		let again = context
			.authorization_header_at(SigningMethod::Get, &url, &test_tokens(), "abc", 1_700_000_000)
			.expect("Signing should succeed.");
		let other_verb = context
			.authorization_header_at(SigningMethod::Post, &url, &test_tokens(), "abc", 1_700_000_000)
			.expect("Signing should succeed.");

		assert_eq!(header, again);
		assert_ne!(header, other_verb);
	}

	#[test]
	fn prepare_attaches_form_body_for_post_and_put() {
		let context = SigningContext::new(test_consumer());
		let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json")
			.expect("Failed to parse test URL.");

		for method in [SigningMethod::Post, SigningMethod::Put] {
			let call = OutboundCall { url: url.clone(), method, tokens: test_tokens() };
			let request = context.prepare(&call).expect("Prepare should succeed.");

			assert_eq!(request.body.as_deref(), Some(""));
			assert_eq!(
				header_value(&request.headers, "content-type"),
				Some("application/x-www-form-urlencoded")
			);
		}

		for method in [SigningMethod::Get, SigningMethod::Delete] {
			let call = OutboundCall { url: url.clone(), method, tokens: test_tokens() };
			let request = context.prepare(&call).expect("Prepare should succeed.");

			assert!(request.body.is_none());
			assert!(request.headers.contains_key("authorization"));
			assert!(!request.headers.contains_key("content-type"));
		}
	}
}
