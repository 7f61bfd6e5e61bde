//! Demonstrates an outgoing service client authenticated by a credential coordinator: the
//! first request acquires a token, the second reuses it, and a `401` drops it from the cache so
//! the following request acquires a new one.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use m2m_auth::{
	cache::{ExpiringCache, MemoryCache},
	client::OutgoingClient,
	config::{CredentialConfig, OutgoingServiceConfig},
	credential::ReqwestCoordinator,
	reqwest::Method,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let items_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/items").header("authorization", "Bearer demo-access");
			then.status(200).body("[]");
		})
		.await;
	let admin_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin");
			then.status(401);
		})
		.await;
	let credential: CredentialConfig = serde_json::from_value(serde_json::json!({
		"Url": server.url("/token"),
		"ClientId": "demo-client",
		"ClientSecret": "super-secret",
		"Resource": "api://inventory",
		"Scope": "inventory.read",
	}))?;
	let service: OutgoingServiceConfig = serde_json::from_value(serde_json::json!({
		"Name": "inventory",
		"Host": server.url("/"),
		"Timeout": 5,
		"DefaultRequestHeaders": [{ "Key": "X-Caller", "Value": "demo-client" }],
	}))?;
	let cache: Arc<dyn ExpiringCache> = Arc::new(MemoryCache::default());
	let coordinator = ReqwestCoordinator::with_cache(&credential, cache)?;
	let client = OutgoingClient::new(&service)?.with_credential(coordinator.clone());

	for _ in 0..2 {
		let request = client.request(Method::GET, "items")?.build()?;
		let (status, body) = client.execute_bytes(request).await?;

		println!("{} answered {status} with {}.", client.name(), String::from_utf8_lossy(&body));
	}

	token_mock.assert_calls_async(1).await;

	let request = client.request(Method::GET, "admin")?.build()?;
	let response = client.execute(request).await?;

	println!("{} answered {}; cached token dropped.", client.name(), response.status());

	let request = client.request(Method::GET, "items")?.build()?;

	client.execute(request).await?;

	token_mock.assert_calls_async(2).await;
	items_mock.assert_calls_async(3).await;
	admin_mock.assert_calls_async(1).await;

	println!(
		"Token endpoint calls: {}, cache hits: {}, invalidations: {}.",
		coordinator.metrics().attempts(),
		coordinator.metrics().cache_hits(),
		coordinator.metrics().invalidations()
	);

	Ok(())
}
