//! Integration tests for the persistent cache
//!
//! These tests exercise the cache through its public API with real TTL
//! strings and wall-clock delays: records served within the TTL, expired
//! after it, shared across cache instances over the same directory, and
//! stable under concurrent access.

use cicerone_sparql::{
    CacheConfig, CacheKey, CacheKeyBuilder, DiskCache, ImageDescriptor, MetadataEntry,
};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

fn cache_with_ttl(dir: &TempDir, ttl: &str) -> DiskCache {
    DiskCache::new(CacheConfig::new(dir.path(), ttl).unwrap()).unwrap()
}

fn manifest_key(id: &str) -> CacheKey {
    CacheKeyBuilder::new("manifest")
        .arg("item_type", "object")
        .arg("id", id)
        .build()
}

#[tokio::test]
async fn test_record_served_within_ttl_then_recomputed_after() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1s");
    let key = manifest_key("1");
    let calls = AtomicUsize::new(0);

    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok("document".to_string()) }
    };

    let first: String = cache.get_or_compute(&key, compute).await.unwrap();
    let second: String = cache.get_or_compute(&key, compute).await.unwrap();
    assert_eq!(first, "document");
    assert_eq!(second, "document");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;

    let third: String = cache.get_or_compute(&key, compute).await.unwrap();
    assert_eq!(third, "document");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let stats = cache.stats().await;
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.stores, 2);
}

#[tokio::test]
async fn test_records_persist_across_cache_instances() {
    let dir = TempDir::new().unwrap();
    let key = manifest_key("1");

    {
        let cache = cache_with_ttl(&dir, "1h");
        cache.put(&key, "durable").await.unwrap();
    }

    let reopened = cache_with_ttl(&dir, "1h");
    assert_eq!(
        reopened.get(&key).await.unwrap(),
        Some("durable".to_string())
    );
}

#[tokio::test]
async fn test_distinct_arguments_store_distinct_records() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1h");

    cache.put(&manifest_key("1"), "first").await.unwrap();
    cache.put(&manifest_key("2"), "second").await.unwrap();

    assert_eq!(
        cache.get(&manifest_key("1")).await.unwrap(),
        Some("first".to_string())
    );
    assert_eq!(
        cache.get(&manifest_key("2")).await.unwrap(),
        Some("second".to_string())
    );
}

#[tokio::test]
async fn test_concurrent_lookups_converge_on_one_value() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1h");
    let key = manifest_key("1");
    let calls = AtomicUsize::new(0);

    let lookups = (0..8).map(|_| {
        cache.get_or_compute(&key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("document".to_string()) }
        })
    });

    for value in join_all(lookups).await {
        assert_eq!(value.unwrap(), "document");
    }

    // concurrent misses may each compute, but afterwards the record is settled
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        cache.get(&key).await.unwrap(),
        Some("document".to_string())
    );
}

#[tokio::test]
async fn test_concurrent_writers_last_one_wins() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1h");
    let key = manifest_key("1");

    let (a, b) = tokio::join!(cache.put(&key, "one"), cache.put(&key, "two"));
    a.unwrap();
    b.unwrap();

    let value = cache.get(&key).await.unwrap().unwrap();
    assert!(value == "one" || value == "two");
}

#[tokio::test]
async fn test_domain_values_round_trip_as_json() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1h");

    let metadata = vec![
        MetadataEntry::no_language("Title", "Mona Lisa"),
        MetadataEntry::no_language("Material", "oil paint, poplar"),
    ];
    let metadata_key = CacheKeyBuilder::new("metadata")
        .arg("subject", "urn:obj/1")
        .build();
    cache.put_json(&metadata_key, &metadata).await.unwrap();
    let restored: Vec<MetadataEntry> = cache.get_json(&metadata_key).await.unwrap().unwrap();
    assert_eq!(restored, metadata);

    let image = ImageDescriptor {
        image: "https://iiif.example.org/img/1".to_string(),
        width: 2000,
        height: 1500,
        metadata: Vec::new(),
    };
    let image_key = CacheKeyBuilder::new("images")
        .arg("subject", "urn:obj/1")
        .build();
    cache.put_json(&image_key, &image).await.unwrap();
    let restored: ImageDescriptor = cache.get_json(&image_key).await.unwrap().unwrap();
    assert_eq!(restored, image);
}

#[tokio::test]
async fn test_ttl_change_at_runtime_extends_record_lifetime() {
    let dir = TempDir::new().unwrap();
    let cache = cache_with_ttl(&dir, "1s");
    let key = manifest_key("1");

    cache.put(&key, "document").await.unwrap();
    cache.set_expiration("1h").await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;

    // under the original 1s TTL this lookup would have expired the record
    assert_eq!(
        cache.get(&key).await.unwrap(),
        Some("document".to_string())
    );
}
