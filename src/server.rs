//! Inbound HTTP surface: a catch-all axum route in front of the [`Forwarder`].
//!
//! Every request passes through the CORS middleware first. `OPTIONS` is answered there; any
//! other verb reaches [`forward_request`], which spawns the forward, reconciles the outcome
//! against the headers the middleware already chose, and writes the result back.

// crates.io
use axum::{
	Extension, Router,
	body::Body,
	extract::{Request, State},
	http::{
		HeaderName, HeaderValue, Method, StatusCode, Uri,
		header::{CONTENT_TYPE, HeaderMap},
	},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::any,
};
use color_eyre::eyre::{Result as EyreResult, WrapErr, eyre};
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
// self
use crate::{
	forward::{Forwarder, InboundRequest},
	http::{Headers, UpstreamHttpClient},
	oauth::TransportErrorMapper,
	reconcile::{self, ReconciledResponse},
};

/// Headers set on every response before the forwarder runs.
pub const CORS_HEADERS: [(&str, &str); 3] = [
	("access-control-allow-origin", "*"),
	("access-control-allow-methods", "GET,PUT,POST,DELETE"),
	("access-control-allow-headers", "X-Requested-With"),
];

/// Connection-scoped headers owned by the inbound server, never relayed from the upstream.
const HOP_BY_HOP_HEADERS: [&str; 4] = ["connection", "keep-alive", "transfer-encoding", "upgrade"];

/// Headers the outer layer has already committed to; they win over upstream values.
#[derive(Clone, Debug, Default)]
pub struct PresetHeaders(pub Headers);

/// Builds the proxy router around `forwarder`.
pub fn router<C, M>(forwarder: Forwarder<C, M>) -> Router
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	Router::new()
		.route("/", any(forward_request::<C, M>))
		.route("/*path", any(forward_request::<C, M>))
		.layer(middleware::from_fn(cors))
		.layer(CompressionLayer::new())
		.layer(TraceLayer::new_for_http())
		.with_state(forwarder)
}

/// Serves `router` on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `log_level` is used, falling back to `info`.
pub fn init_tracing(log_level: Option<&str>) -> EyreResult<()> {
	let filter = if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
		EnvFilter::from_default_env()
	} else {
		let directive = log_level.unwrap_or("info");

		EnvFilter::try_new(directive)
			.wrap_err_with(|| format!("invalid log level filter: {directive}"))?
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init()
		.map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %e, "failed to listen for shutdown signal");
	}

	tracing::info!("received shutdown signal, draining connections");
}

async fn cors(mut request: Request, next: Next) -> Response {
	if request.method() == Method::OPTIONS {
		let mut response = (StatusCode::OK, "OK").into_response();

		apply_headers(response.headers_mut(), cors_headers());

		return response;
	}

	request.extensions_mut().insert(PresetHeaders(cors_headers()));

	next.run(request).await
}

async fn forward_request<C, M>(
	State(forwarder): State<Forwarder<C, M>>,
	preset: Option<Extension<PresetHeaders>>,
	method: Method,
	uri: Uri,
) -> Response
where
	C: UpstreamHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let existing = preset.map(|Extension(PresetHeaders(headers))| headers).unwrap_or_default();
	let inbound = InboundRequest::from_raw_query(method.as_str(), uri.path(), uri.query());
	// Dropping the task when the caller disconnects aborts the upstream call.
	let task = forwarder.spawn(inbound);
	let reconciled = match task.await {
		Ok(result) => reconcile::reconcile(result, &existing),
		Err(e) => {
			tracing::warn!(%method, path = uri.path(), error = %e, "forward failed");

			ReconciledResponse::from_error(&e, &existing)
		},
	};

	into_response(reconciled)
}

fn cors_headers() -> Headers {
	CORS_HEADERS
		.iter()
		.map(|(name, value)| ((*name).to_owned(), vec![(*value).to_owned()]))
		.collect()
}

fn into_response(reconciled: ReconciledResponse) -> Response {
	let ReconciledResponse { headers, status, body } = reconciled;
	let content_type = body.content_type();
	let mut response = Response::new(Body::from(body.into_bytes()));

	*response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);

	apply_headers(
		response.headers_mut(),
		headers.into_iter().filter(|(name, _)| {
			!HOP_BY_HOP_HEADERS.iter().any(|hop| name.eq_ignore_ascii_case(hop))
		}),
	);
	response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

	response
}

fn apply_headers(map: &mut HeaderMap, headers: impl IntoIterator<Item = (String, Vec<String>)>) {
	for (name, values) in headers {
		let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
			tracing::debug!(header = %name, "skipping header name that is not valid on the wire");

			continue;
		};

		map.remove(&header);

		for value in values {
			let Ok(value) = HeaderValue::from_str(&value) else {
				tracing::debug!(header = %name, "skipping header value that is not valid on the wire");

				continue;
			};

			map.append(header.clone(), value);
		}
	}
}
