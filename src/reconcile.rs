//! Response reconciliation: header merging and best-effort JSON body resolution.
//!
//! [`reconcile`] turns an [`UpstreamResult`] into the single [`ReconciledResponse`] shape the
//! inbound surface writes back to the caller. The status always mirrors the upstream; the
//! headers are the upstream's minus the content headers, merged under whatever the outer layer
//! already set; the body is parsed JSON when possible and raw text otherwise.

// crates.io
use serde_json::{Value, json};
// self
use crate::{_prelude::*, forward::UpstreamResult, http::Headers};

/// Upstream headers that are regenerated by the outbound transport and never relayed.
pub const FILTERED_HEADERS: [&str; 2] = ["content-length", "content-type"];

/// `Content-Type` sent with a JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// `Content-Type` sent with a text body.
pub const TEXT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Body handed to the outbound response sink.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Body parsed as JSON.
	Json(Value),
	/// Body that did not parse, kept verbatim.
	Text(String),
}
impl ResponseBody {
	/// `Content-Type` matching the body variant.
	pub const fn content_type(&self) -> &'static str {
		match self {
			Self::Json(_) => JSON_CONTENT_TYPE,
			Self::Text(_) => TEXT_CONTENT_TYPE,
		}
	}

	/// Serialized body bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		match self {
			Self::Json(value) => value.to_string().into_bytes(),
			Self::Text(text) => text.into_bytes(),
		}
	}

	fn parse(raw: &str) -> Option<Self> {
		serde_json::from_str(raw).ok().map(Self::Json)
	}
}

/// Normalized response written back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledResponse {
	/// Headers to set on the outbound response.
	pub headers: Headers,
	/// HTTP status code.
	pub status: u16,
	/// Response body.
	pub body: ResponseBody,
}
impl ReconciledResponse {
	/// Renders a local failure as `{"errors":[{"message": ...}]}` with the error's status.
	///
	/// `existing` headers are kept as-is.
	pub fn from_error(error: &Error, existing: &Headers) -> Self {
		Self {
			headers: existing.clone(),
			status: error.status_code(),
			body: ResponseBody::Json(json!({ "errors": [{ "message": error.to_string() }] })),
		}
	}
}

/// Reconciles an upstream outcome with the headers already present on the outbound response.
pub fn reconcile(result: UpstreamResult, existing: &Headers) -> ReconciledResponse {
	let headers = merge_headers(existing, filter_headers(result.headers()));
	let status = result.status();
	let body = match &result {
		UpstreamResult::Success { body, .. } => resolve_body(Some(body.as_str()), None),
		// The transport hands the error body back as both the error data and the body string.
		UpstreamResult::Failure { raw_body, .. } => {
			let raw = raw_body.as_str();

			resolve_body(Some(raw), Some(raw))
		},
	};

	ReconciledResponse { headers, status, body }
}

/// Copies `upstream` without the content headers, matching names case-insensitively.
pub fn filter_headers(upstream: &Headers) -> Headers {
	upstream
		.iter()
		.filter(|(name, _)| !FILTERED_HEADERS.iter().any(|f| name.eq_ignore_ascii_case(f)))
		.map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
		.collect()
}

/// Merges `upstream` under `existing`; on a name clash the existing value is kept.
pub fn merge_headers(existing: &Headers, upstream: Headers) -> Headers {
	let mut merged = existing.clone();

	for (name, value) in upstream {
		if !merged.keys().any(|present| present.eq_ignore_ascii_case(&name)) {
			merged.insert(name, value);
		}
	}

	merged
}

/// Resolves the final body from the success body string and, on failure, the error data.
///
/// The error data is tried first, then the success body string is reparsed unconditionally:
/// whenever it is valid JSON it wins, even over an error body that was already resolved.
pub fn resolve_body(success_body: Option<&str>, error_data: Option<&str>) -> ResponseBody {
	let mut body = ResponseBody::Text(success_body.unwrap_or_default().to_owned());

	if let Some(data) = error_data {
		body = ResponseBody::parse(data).unwrap_or_else(|| ResponseBody::Text(data.to_owned()));
	}
	if let Some(parsed) = success_body.and_then(ResponseBody::parse) {
		body = parsed;
	}

	body
}
