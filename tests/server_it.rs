#![cfg(feature = "server")]

// std
use std::net::SocketAddr;
// crates.io
use httpmock::prelude::*;
use tokio::net::TcpListener;
// self
use twitter_proxy::{_preludet::*, reqwest, server};

async fn spawn_proxy(upstream_base_url: &str) -> SocketAddr {
	let forwarder = build_reqwest_test_forwarder(upstream_base_url);
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind proxy test listener.");
	let addr = listener.local_addr().expect("Proxy test listener should expose its address.");

	tokio::spawn(server::serve(listener, server::router(forwarder)));

	addr
}

fn client() -> reqwest::Client {
	reqwest::Client::new()
}

#[tokio::test]
async fn success_relays_status_headers_and_json_body() {
	let upstream = MockServer::start_async().await;
	let mock = upstream
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/statuses/show.json").query_param("id", "123");
			then.status(200)
				.header("content-type", "application/json; charset=utf-8")
				.header("x-rate-limit-remaining", "10")
				.header("access-control-allow-origin", "https://twitter.com")
				.body("{\"id\":123}");
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response = client()
		.get(format!("http://{addr}/1.1/statuses/show.json?id=123"))
		.send()
		.await
		.expect("Proxy should answer.");

	mock.assert_calls_async(1).await;

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(response.headers()["access-control-allow-origin"], "*");
	assert_eq!(response.headers()["access-control-allow-methods"], "GET,PUT,POST,DELETE");
	assert_eq!(response.headers()["access-control-allow-headers"], "X-Requested-With");
	assert_eq!(response.headers()["x-rate-limit-remaining"], "10");
	assert_eq!(response.headers()["content-type"], "application/json");
	assert_eq!(response.text().await.expect("Body should be readable."), "{\"id\":123}");
}

#[tokio::test]
async fn repeated_set_cookie_headers_stay_separate() {
	let upstream = MockServer::start_async().await;
	let _mock = upstream
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/account/settings.json");
			then.status(200)
				.header("set-cookie", "guest_id=v1%3A1; Expires=Thu, 01 Jan 2030 00:00:00 GMT")
				.header("set-cookie", "personalization_id=abc")
				.body("{}");
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response = client()
		.get(format!("http://{addr}/1.1/account/settings.json"))
		.send()
		.await
		.expect("Proxy should answer.");
	let cookies = response
		.headers()
		.get_all("set-cookie")
		.iter()
		.map(|value| value.to_str().expect("Cookie should be ASCII.").to_owned())
		.collect::<Vec<_>>();

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(
		cookies,
		vec![
			"guest_id=v1%3A1; Expires=Thu, 01 Jan 2030 00:00:00 GMT".to_owned(),
			"personalization_id=abc".to_owned(),
		]
	);
}

#[tokio::test]
async fn upstream_errors_keep_their_status() {
	let upstream = MockServer::start_async().await;
	let _mock = upstream
		.mock_async(|when, then| {
			when.method(POST).path("/1.1/statuses/update.json");
			then.status(401).body("{\"errors\":[{\"code\":89,\"message\":\"Invalid token\"}]}");
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response = client()
		.post(format!("http://{addr}/1.1/statuses/update.json?status=hi"))
		.send()
		.await
		.expect("Proxy should answer.");

	assert_eq!(response.status().as_u16(), 401);
	assert_eq!(response.headers()["content-type"], "application/json");
	assert_eq!(
		response.text().await.expect("Body should be readable."),
		"{\"errors\":[{\"code\":89,\"message\":\"Invalid token\"}]}"
	);
}

#[tokio::test]
async fn text_bodies_pass_through_verbatim() {
	let upstream = MockServer::start_async().await;
	let _mock = upstream
		.mock_async(|when, then| {
			when.method(GET).path("/robots.txt");
			then.status(200).header("content-type", "text/plain").body("plain text");
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response =
		client().get(format!("http://{addr}/robots.txt")).send().await.expect("Proxy should answer.");

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
	assert_eq!(response.text().await.expect("Body should be readable."), "plain text");
}

#[tokio::test]
async fn options_is_answered_locally() {
	let upstream = MockServer::start_async().await;
	let mock = upstream
		.mock_async(|when, then| {
			when.path("/1.1/statuses/update.json");
			then.status(200);
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response = client()
		.request(reqwest::Method::OPTIONS, format!("http://{addr}/1.1/statuses/update.json"))
		.send()
		.await
		.expect("Proxy should answer.");

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(response.headers()["access-control-allow-origin"], "*");
	assert_eq!(response.text().await.expect("Body should be readable."), "OK");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unknown_verbs_get_method_not_allowed() {
	let upstream = MockServer::start_async().await;
	let mock = upstream
		.mock_async(|when, then| {
			when.path("/1.1/statuses/update.json");
			then.status(200);
		})
		.await;
	let addr = spawn_proxy(&upstream.base_url()).await;
	let response = client()
		.patch(format!("http://{addr}/1.1/statuses/update.json"))
		.send()
		.await
		.expect("Proxy should answer.");

	assert_eq!(response.status().as_u16(), 405);
	assert_eq!(response.headers()["access-control-allow-origin"], "*");
	assert_eq!(
		response.text().await.expect("Body should be readable."),
		"{\"errors\":[{\"message\":\"Unknown method `PATCH`.\"}]}"
	);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
	let closed = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind probe listener.");
	let closed_addr = closed.local_addr().expect("Probe listener should expose its address.");

	drop(closed);

	let addr = spawn_proxy(&format!("http://{closed_addr}")).await;
	let response = client()
		.get(format!("http://{addr}/1.1/statuses/home_timeline.json"))
		.send()
		.await
		.expect("Proxy should answer.");

	assert_eq!(response.status().as_u16(), 502);
	assert_eq!(response.headers()["content-type"], "application/json");
}
