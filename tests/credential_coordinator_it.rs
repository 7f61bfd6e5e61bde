// crates.io
use httpmock::prelude::*;
// self
use m2m_auth::{
	_preludet::*,
	cache::{ExpiringCache, MemoryCache},
	config::CredentialConfig,
	credential::CredentialCoordinator,
	error::{ProtocolError, TransportError},
	http::ReqwestHttpClient,
	reqwest::header::{AUTHORIZATION, HeaderMap},
};

fn token_body(token: &str, expires_in: i64) -> String {
	serde_json::json!({ "access_token": token, "token_type": "Bearer", "expires_in": expires_in })
		.to_string()
}

fn request_body(scope: &str) -> serde_json::Value {
	serde_json::json!({
		"client_id": TEST_CLIENT_ID,
		"client_secret": TEST_CLIENT_SECRET,
		"resource": TEST_RESOURCE,
		"scope": scope,
	})
}

async fn mock_token<'a>(
	server: &'a MockServer,
	token: &str,
	expires_in: i64,
) -> httpmock::Mock<'a> {
	let body = token_body(token, expires_in);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

#[tokio::test]
async fn cached_token_is_reused_until_the_safety_margin() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "cached-token", 600).await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, _cache, clock) = build_reqwest_test_coordinator(&config);
	let first = coordinator.access_token().await.expect("Initial acquisition should succeed.");

	clock.advance(Duration::seconds(299));

	let second = coordinator.access_token().await.expect("Cached acquisition should succeed.");

	assert_eq!(first.expose(), "cached-token");
	assert_eq!(second.expose(), "cached-token");

	mock.assert_calls_async(1).await;

	clock.advance(Duration::seconds(2));
	coordinator.access_token().await.expect("Acquisition past the safety margin should succeed.");

	mock.assert_calls_async(2).await;
	assert_eq!(coordinator.metrics().cache_hits(), 1);
	assert_eq!(coordinator.metrics().attempts(), 2);
}

#[tokio::test]
async fn short_lived_tokens_are_never_served_from_cache() {
	for expires_in in [200, 300] {
		let server = MockServer::start_async().await;
		let mock = mock_token(&server, "short-lived", expires_in).await;
		let config = test_credential_config(&server.url("/token"));
		let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);

		coordinator.access_token().await.expect("First acquisition should succeed.");
		coordinator.access_token().await.expect("Second acquisition should succeed.");

		mock.assert_calls_async(2).await;
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_acquisition() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(200))
				.body(token_body("single-flight", 3600));
		})
		.await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);
	let mut tasks = Vec::new();

	for _ in 0..16 {
		let coordinator = coordinator.clone();

		tasks.push(tokio::spawn(async move { coordinator.access_token().await }));
	}

	for task in tasks {
		let token = task
			.await
			.expect("Coordinator task should not panic.")
			.expect("Concurrent acquisition should succeed.");

		assert_eq!(token.expose(), "single-flight");
	}

	mock.assert_calls_async(1).await;
	assert_eq!(coordinator.metrics().attempts(), 1);
	assert_eq!(coordinator.metrics().cache_hits(), 15);
}

#[tokio::test]
async fn invalidate_forces_exactly_one_new_acquisition() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "rotating", 3600).await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, cache, _clock) = build_reqwest_test_coordinator(&config);

	coordinator.access_token().await.expect("Initial acquisition should succeed.");
	coordinator.invalidate().await.expect("Invalidation should succeed.");
	coordinator.invalidate().await.expect("Repeated invalidation should be a no-op.");

	assert!(cache.is_empty());

	coordinator.access_token().await.expect("Acquisition after invalidation should succeed.");
	coordinator.access_token().await.expect("Cached acquisition should succeed.");

	mock.assert_calls_async(2).await;
	assert_eq!(coordinator.metrics().invalidations(), 2);
}

#[tokio::test]
async fn attach_sets_the_bearer_header() {
	let server = MockServer::start_async().await;
	let _mock = mock_token(&server, "header-token", 3600).await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);
	let mut headers = HeaderMap::new();

	coordinator.attach_credential(&mut headers).await.expect("Attaching should succeed.");

	assert_eq!(
		headers.get(AUTHORIZATION).expect("Authorization header should be set."),
		"Bearer header-token"
	);
}

#[tokio::test]
async fn provider_errors_surface_and_leave_nothing_behind() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500).header("retry-after", "30").body("upstream exploded");
		})
		.await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, cache, _clock) = build_reqwest_test_coordinator(&config);
	let mut headers = HeaderMap::new();
	let err = coordinator
		.attach_credential(&mut headers)
		.await
		.expect_err("Provider failures should surface to the caller.");

	match err {
		Error::Protocol(ProtocolError::UnexpectedStatus { status, retry_after, body_preview }) => {
			assert_eq!(status, 500);
			assert_eq!(retry_after, Some(Duration::seconds(30)));
			assert_eq!(body_preview, "upstream exploded");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(headers.is_empty(), "A failed attach must leave the request untouched.");
	assert!(cache.is_empty(), "Failures must never be cached.");

	coordinator.access_token().await.expect_err("The next call should retry and fail again.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn malformed_json_is_a_protocol_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"x\",\"expires_in\":\"soon\"}");
		})
		.await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);
	let err = coordinator.access_token().await.expect_err("Malformed bodies should be rejected.");

	assert!(matches!(
		err,
		Error::Protocol(ProtocolError::MalformedResponse { status: 200, .. })
	));
}

#[tokio::test]
async fn empty_access_token_is_a_missing_credential() {
	let server = MockServer::start_async().await;
	let _mock = mock_token(&server, "", 3600).await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, cache, _clock) = build_reqwest_test_coordinator(&config);
	let err = coordinator.access_token().await.expect_err("Empty tokens should be rejected.");

	assert!(matches!(err, Error::MissingCredential { .. }));
	assert!(cache.is_empty());
}

#[tokio::test]
async fn slow_provider_hits_the_configured_timeout() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).delay(StdDuration::from_secs(3)).body(token_body("late", 3600));
		})
		.await;
	let config = CredentialConfig {
		timeout: StdDuration::from_secs(1),
		..test_credential_config(&server.url("/token"))
	};
	let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);
	let err = coordinator.access_token().await.expect_err("Stalled providers should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout { .. })));
}

#[tokio::test]
async fn request_body_keeps_scope_and_resource_apart() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/json")
				.json_body(request_body(TEST_SCOPE));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("exact-body", 3600));
		})
		.await;
	let config = test_credential_config(&server.url("/token"));
	let (coordinator, _cache, _clock) = build_reqwest_test_coordinator(&config);

	coordinator.access_token().await.expect("Request body should match the provider contract.");

	mock.assert_async().await;
}

#[tokio::test]
async fn coordinators_with_distinct_scopes_do_not_share_tokens() {
	let server = MockServer::start_async().await;
	let read_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").json_body(request_body("inventory.read"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("read-token", 3600));
		})
		.await;
	let write_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").json_body(request_body("inventory.write"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("write-token", 3600));
		})
		.await;
	let cache: Arc<dyn ExpiringCache> = Arc::new(MemoryCache::default());
	let read_config = test_credential_config(&server.url("/token"));
	let write_config =
		CredentialConfig { scope: "inventory.write".into(), ..read_config.clone() };
	let reader = CredentialCoordinator::<ReqwestHttpClient>::with_cache(&read_config, cache.clone())
		.expect("Reader coordinator should build.");
	let writer = CredentialCoordinator::<ReqwestHttpClient>::with_cache(&write_config, cache)
		.expect("Writer coordinator should build.");

	assert_ne!(reader.cache_key(), writer.cache_key());
	assert_eq!(reader.access_token().await.expect("Reader should acquire.").expose(), "read-token");
	assert_eq!(
		writer.access_token().await.expect("Writer should acquire.").expose(),
		"write-token"
	);

	writer.invalidate().await.expect("Invalidation should succeed.");

	assert_eq!(
		reader.access_token().await.expect("Reader should stay cached.").expose(),
		"read-token"
	);

	read_mock.assert_calls_async(1).await;
	write_mock.assert_calls_async(1).await;
}

#[test]
fn zero_timeout_is_rejected_at_construction() {
	let config = CredentialConfig {
		timeout: StdDuration::ZERO,
		..test_credential_config("https://idp.example.com/token")
	};
	let err = CredentialCoordinator::<ReqwestHttpClient>::with_cache(
		&config,
		Arc::new(MemoryCache::default()),
	)
	.expect_err("Zero timeouts should be rejected.");

	assert!(err.to_string().contains("timeout"));
}
