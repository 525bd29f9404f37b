//! twitter-proxy binary: loads the config, then serves the signing proxy until ctrl-c.

// std
use std::net::{Ipv4Addr, SocketAddr};
// crates.io
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
// self
use twitter_proxy::{
	config::{Cli, Config},
	forward::{Forwarder, ReqwestForwarder},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	server,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();
	let config = Config::load(&cli.config)
		.wrap_err_with(|| format!("failed to load config from `{}`", cli.config))?;

	server::init_tracing(config.log_level.as_deref())?;

	let http_client = ReqwestHttpClient::with_timeout(config.upstream_timeout())?;
	let forwarder: ReqwestForwarder = Forwarder::with_http_client(
		config.consumer(),
		config.tokens(),
		http_client,
		ReqwestTransportErrorMapper,
	);
	let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
	let listener =
		TcpListener::bind(addr).await.wrap_err_with(|| format!("failed to bind {addr}"))?;

	tracing::info!("twitter-proxy server ready: http://localhost:{}", config.port);

	server::serve(listener, server::router(forwarder)).await?;

	tracing::info!("all connections drained, exiting");

	Ok(())
}
