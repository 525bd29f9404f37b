//! Startup configuration: the JSON config file and the command line that points at it.

// std
use std::{path::Path, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{AccountTokens, ConsumerCredentials, Secret},
	error::ConfigError,
};

/// Port the proxy listens on when the config file does not set one.
pub const DEFAULT_PORT: u16 = 7890;
/// Upstream request timeout applied when the config file does not set one.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
/// Config file read when neither `--config` nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Environment variable consulted for the config file path.
pub const CONFIG_PATH_ENV: &str = "TWITTER_PROXY_CONFIG";

/// Command-line arguments of the proxy binary.
#[cfg(feature = "server")]
#[derive(Debug, clap::Parser)]
#[command(version, about = "Single-account OAuth 1.0a signing proxy for the Twitter REST API.")]
pub struct Cli {
	/// Path of the JSON config file.
	#[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
	pub config: String,
}

/// Resolved proxy configuration.
///
/// Credentials that are absent from the file deserialize as empty strings so
/// [`validate`](Self::validate) can name the missing field.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	/// OAuth consumer key.
	#[serde(default)]
	pub consumer_key: String,
	/// OAuth consumer secret.
	#[serde(default = "empty_secret")]
	pub consumer_secret: Secret,
	/// Access token of the proxied account.
	#[serde(default)]
	pub access_token: String,
	/// Access token secret of the proxied account.
	#[serde(default = "empty_secret")]
	pub access_token_secret: Secret,
	/// Listening port.
	#[serde(default = "default_port")]
	pub port: u16,
	/// Seconds to wait for the upstream before giving up.
	#[serde(default = "default_upstream_timeout_secs")]
	pub upstream_timeout_secs: u64,
	/// `tracing` filter directive used when `RUST_LOG` is unset.
	#[serde(default)]
	pub log_level: Option<String>,
}
impl Config {
	/// Reads, parses, and validates the config file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

		Self::from_json(&raw)
			.map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?
			.validate()
	}

	/// Parses a config document without validating it.
	pub fn from_json(raw: &str) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Rejects empty credentials.
	pub fn validate(self) -> Result<Self, ConfigError> {
		let checks = [
			("consumerKey", self.consumer_key.trim().is_empty()),
			("consumerSecret", self.consumer_secret.is_blank()),
			("accessToken", self.access_token.trim().is_empty()),
			("accessTokenSecret", self.access_token_secret.is_blank()),
		];

		if let Some((field, _)) = checks.into_iter().find(|(_, missing)| *missing) {
			return Err(ConfigError::MissingField { field });
		}

		Ok(self)
	}

	/// Consumer credentials for the signing context.
	pub fn consumer(&self) -> ConsumerCredentials {
		ConsumerCredentials {
			consumer_key: self.consumer_key.clone(),
			consumer_secret: self.consumer_secret.clone(),
		}
	}

	/// Account tokens every request is signed with.
	pub fn tokens(&self) -> AccountTokens {
		AccountTokens {
			access_token: self.access_token.clone(),
			access_token_secret: self.access_token_secret.clone(),
		}
	}

	/// Upstream request timeout.
	pub fn upstream_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.upstream_timeout_secs)
	}
}

fn empty_secret() -> Secret {
	Secret::new(String::new())
}

fn default_port() -> u16 {
	DEFAULT_PORT
}

fn default_upstream_timeout_secs() -> u64 {
	DEFAULT_UPSTREAM_TIMEOUT_SECS
}
