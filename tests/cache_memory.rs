// crates.io
use time::macros;
// self
use m2m_auth::{
	_preludet::*,
	cache::{CacheError, CacheValue, ExpiringCache, MemoryCache},
	clock::{Clock, ManualClock},
};

fn build_cache() -> (MemoryCache, ManualClock) {
	let clock = ManualClock::new(macros::datetime!(2025-11-10 12:00 UTC));
	let cache = MemoryCache::with_clock(Arc::new(clock.clone()) as Arc<dyn Clock>);

	(cache, clock)
}

#[tokio::test]
async fn never_set_key_is_absent() {
	let (cache, _clock) = build_cache();
	let value = cache.get("missing").await.expect("Memory cache reads should succeed.");

	assert_eq!(value, None);
}

#[tokio::test]
async fn entry_is_visible_until_its_ttl_elapses() {
	let (cache, clock) = build_cache();

	cache
		.set("token", "abc".into(), Some(Duration::seconds(30)))
		.await
		.expect("Memory cache writes should succeed.");
	clock.advance(Duration::seconds(29));

	assert_eq!(
		cache.get("token").await.expect("Memory cache reads should succeed."),
		Some(CacheValue::from("abc"))
	);

	clock.advance(Duration::seconds(1));

	assert_eq!(cache.get("token").await.expect("Memory cache reads should succeed."), None);
	assert!(cache.is_empty(), "The read that saw the expired entry should have removed it.");
}

#[tokio::test]
async fn entry_without_ttl_survives_clock_movement() {
	let (cache, clock) = build_cache();

	cache.set("config", CacheValue::Int(42), None).await.expect("Memory cache writes should succeed.");
	clock.advance(Duration::weeks(52));

	assert_eq!(
		cache.get("config").await.expect("Memory cache reads should succeed."),
		Some(CacheValue::Int(42))
	);
}

#[tokio::test]
async fn delete_removes_and_tolerates_missing_keys() {
	let (cache, _clock) = build_cache();

	cache
		.set("token", CacheValue::Bytes(vec![1, 2, 3]), Some(Duration::minutes(5)))
		.await
		.expect("Memory cache writes should succeed.");
	cache.delete("token").await.expect("Deleting a present key should succeed.");

	assert_eq!(cache.get("token").await.expect("Memory cache reads should succeed."), None);

	cache.delete("token").await.expect("Deleting a missing key should be a no-op.");
	cache.delete("never-set").await.expect("Deleting a missing key should be a no-op.");
}

#[tokio::test]
async fn get_string_reports_type_mismatches() {
	let (cache, _clock) = build_cache();

	cache.set("count", CacheValue::Int(3), None).await.expect("Memory cache writes should succeed.");

	let err = cache.get_string("count").await.expect_err("Integers must not read as strings.");

	assert_eq!(
		err,
		CacheError::TypeMismatch { key: "count".into(), expected: "string", found: "int" }
	);
	assert_eq!(cache.get_string("absent").await, Ok(None));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_and_writers_see_consistent_values() {
	let cache = Arc::new(MemoryCache::default());
	let mut tasks = Vec::new();

	for worker in 0..16_i64 {
		let cache = cache.clone();

		tasks.push(tokio::spawn(async move {
			let key = format!("worker-{}", worker % 4);

			for round in 0..50_i64 {
				cache
					.set(&key, CacheValue::Int(round), Some(Duration::minutes(1)))
					.await
					.expect("Memory cache writes should succeed.");

				let value = cache.get(&key).await.expect("Memory cache reads should succeed.");

				assert!(matches!(value, Some(CacheValue::Int(_))));
			}
		}));
	}

	for task in tasks {
		task.await.expect("Cache worker should not panic.");
	}

	assert_eq!(cache.len(), 4);
}
