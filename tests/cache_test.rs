//! Persistence tests for the ASIN cache.

use std::sync::Arc;

use bookhound::cache::{AsinCache, CacheEntry};
use bookhound::models::SourceKind;

#[test]
fn round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asin-cache.json");

    {
        let cache = AsinCache::open(Some(path.clone()), Some(30));
        cache
            .put("mistborn|brandon sanderson|", CacheEntry::positive("B000UZQI0Q".into(), SourceKind::GoogleBooks))
            .unwrap();
        cache.put("unfindable|nobody|", CacheEntry::negative()).unwrap();
    }

    let cache = AsinCache::open(Some(path), Some(30));
    let entry = cache.get("mistborn|brandon sanderson|").unwrap();
    assert_eq!(entry.asin.as_deref(), Some("B000UZQI0Q"));
    assert_eq!(entry.source, Some(SourceKind::GoogleBooks));

    let negative = cache.get("unfindable|nobody|").unwrap();
    assert!(negative.asin.is_none());

    let stats = cache.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.positive, 1);
    assert_eq!(stats.negative, 1);
}

#[test]
fn corrupted_document_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asin-cache.json");
    std::fs::write(&path, "{\"version\": 1, \"entries\": {\"trunc").unwrap();

    let cache = AsinCache::open(Some(path.clone()), Some(30));
    assert_eq!(cache.stats().total, 0);

    // The cache is usable again and the next write produces a valid doc.
    cache
        .put("k", CacheEntry::positive("B000UZQI0Q".into(), SourceKind::Amazon))
        .unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&content).is_ok());
}

#[test]
fn garbage_bytes_degrade_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asin-cache.json");
    std::fs::write(&path, [0u8, 159, 146, 150]).unwrap();

    let cache = AsinCache::open(Some(path), Some(30));
    assert_eq!(cache.stats().total, 0);
}

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cache = AsinCache::open(Some(dir.path().join("does-not-exist.json")), Some(30));
    assert_eq!(cache.stats().total, 0);
}

#[test]
fn parent_directories_created_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/asin-cache.json");

    let cache = AsinCache::open(Some(path.clone()), Some(30));
    cache.put("k", CacheEntry::negative()).unwrap();
    assert!(path.exists());
}

#[test]
fn concurrent_writers_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asin-cache.json");
    let cache = Arc::new(AsinCache::open(Some(path.clone()), Some(30)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for j in 0..10 {
                    let key = format!("book-{i}-{j}");
                    cache
                        .put(&key, CacheEntry::positive(format!("B{i}{j}0000000"), SourceKind::Amazon))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.stats().total, 80);

    // The document on disk is complete and parseable after the races.
    let reopened = AsinCache::open(Some(path), Some(30));
    assert_eq!(reopened.stats().total, 80);
}
