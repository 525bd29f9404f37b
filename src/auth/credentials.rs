//! Consumer credentials and account tokens for the single proxied account.

// self
use crate::{_prelude::*, auth::Secret};

/// Identifies the calling application to the upstream API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerCredentials {
	/// OAuth consumer key.
	pub consumer_key: String,
	/// OAuth consumer secret.
	pub consumer_secret: Secret,
}
impl ConsumerCredentials {
	/// Creates a consumer key/secret pair.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
		Self { consumer_key: consumer_key.into(), consumer_secret: Secret::new(consumer_secret) }
	}
}

/// Identifies the account on whose behalf every request is signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountTokens {
	/// OAuth access token.
	pub access_token: String,
	/// OAuth access token secret.
	pub access_token_secret: Secret,
}
impl AccountTokens {
	/// Creates an access token/secret pair.
	pub fn new(access_token: impl Into<String>, access_token_secret: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			access_token_secret: Secret::new(access_token_secret),
		}
	}
}
