//! OAuth 1.0a HMAC-SHA1 primitives: percent-encoding, base strings, and header rendering.
//!
//! The signature base string is
//!
//! ```text
//! METHOD&enc(base_string_uri)&enc(normalized_parameters)
//! ```
//!
//! where `normalized_parameters` is every OAuth and query parameter, encoded, sorted by key
//! then value, and joined as `k=v` pairs with `&`. The signing key is
//! `enc(consumer_secret)&enc(token_secret)`.

// std
use std::fmt::Write as _;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
// self
use crate::{_prelude::*, error::ConfigError};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;
/// Everything outside the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`) is escaped.
const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `input` the way OAuth 1.0a requires.
pub fn percent_encode(input: &str) -> String {
	utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Serializes query pairs in order, without re-ordering or dropping repeated keys.
pub fn encode_query(pairs: &[(String, String)]) -> String {
	let mut buf = String::new();

	for (idx, (key, value)) in pairs.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.push_str(&percent_encode(key));
		buf.push('=');
		buf.push_str(&percent_encode(value));
	}

	buf
}

/// Generates a fresh alphanumeric nonce.
pub fn nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

/// Scheme, lower-cased host, non-default port, and path of `url`.
pub fn base_string_uri(url: &Url) -> String {
	let mut uri = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());

	uri.make_ascii_lowercase();

	if let Some(port) = url.port() {
		let _ = write!(uri, ":{port}");
	}

	uri.push_str(url.path());

	uri
}

/// Encodes, sorts, and joins every signed parameter.
pub fn normalize_parameters(params: &[(String, String)]) -> String {
	let mut encoded = params
		.iter()
		.map(|(key, value)| (percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>();

	encoded.sort();

	encoded.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

/// Builds the signature base string for `method` against `url`.
///
/// `params` must already contain the query parameters of `url`; only the base URI is read
/// from `url` itself.
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(&base_string_uri(url)),
		percent_encode(&normalize_parameters(params))
	)
}

/// Signs `base_string` with HMAC-SHA1 and returns the base64 signature.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
	let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| ConfigError::SigningKey)?;

	mac.update(base_string.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Renders `OAuth k="v",...` from the protocol parameters, sorted by key.
pub fn authorization_header(oauth_params: &[(String, String)]) -> String {
	let mut sorted = oauth_params.iter().collect::<Vec<_>>();

	sorted.sort();

	let fields = sorted
		.into_iter()
		.map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join(",");

	format!("OAuth {fields}")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
		raw.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn percent_encoding_keeps_only_unreserved() {
		assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
		assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
		assert_eq!(percent_encode("☃"), "%E2%98%83");
		assert_eq!(percent_encode("!*'()"), "%21%2A%27%28%29");
	}

	#[test]
	fn query_encoding_preserves_order_and_duplicates() {
		let query = pairs(&[("z", "1"), ("a", "two words"), ("z", "3")]);

		assert_eq!(encode_query(&query), "z=1&a=two%20words&z=3");
		assert_eq!(encode_query(&[]), "");
	}

	#[test]
	fn base_uri_drops_default_port_and_query() {
		let url = Url::parse("HTTPS://API.Twitter.com:443/1.1/statuses/show.json?id=1")
			.expect("Failed to parse test URL.");

		assert_eq!(base_string_uri(&url), "https://api.twitter.com/1.1/statuses/show.json");

		let url = Url::parse("http://127.0.0.1:8080/x").expect("Failed to parse test URL.");

		assert_eq!(base_string_uri(&url), "http://127.0.0.1:8080/x");
	}

	#[test]
	fn nonce_is_alphanumeric() {
		let value = nonce();

		assert_eq!(value.len(), NONCE_LEN);
		assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(value, nonce());
	}

	// Published walkthrough vector from the Twitter developer documentation.
	#[test]
	fn hmac_sha1_matches_published_vector() {
		let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true")
			.expect("Failed to parse vector URL.");
		let params = pairs(&[
			("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
			("include_entities", "true"),
			("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
			("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
			("oauth_signature_method", "HMAC-SHA1"),
			("oauth_timestamp", "1318622958"),
			("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
			("oauth_version", "1.0"),
		]);

		assert_eq!(
			normalize_parameters(&params),
			"include_entities=true&oauth_consumer_key=xvz1evFS4wEEPTGEFPHBog&oauth_nonce=kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg&oauth_signature_method=HMAC-SHA1&oauth_timestamp=1318622958&oauth_token=370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb&oauth_version=1.0&status=Hello%20Ladies%20%2B%20Gentlemen%2C%20a%20signed%20OAuth%20request%21"
		);

		let base = signature_base_string("post", &url, &params);

		assert!(base.starts_with(
			"POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26"
		));

		let signature = sign(
			&base,
			"kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
			"LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
		)
		.expect("HMAC key should always initialize.");

		assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
	}

	#[test]
	fn header_sorts_and_quotes_parameters() {
		let header = authorization_header(&pairs(&[
			("oauth_token", "t"),
			("oauth_signature", "a+b="),
			("oauth_consumer_key", "k"),
		]));

		assert_eq!(
			header,
			"OAuth oauth_consumer_key=\"k\",oauth_signature=\"a%2Bb%3D\",oauth_token=\"t\""
		);
	}
}
