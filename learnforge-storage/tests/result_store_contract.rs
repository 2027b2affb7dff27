//! Contract checks every `ResultStore` must satisfy, run against the
//! in-memory store, plus cache behaviour seen through the trait object.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use learnforge_core::{ErrorKind, GenerationRequest, GenerationResult, ResultMeta, StoredRecord, TopicSource};
use learnforge_storage::{CacheBackend, InMemoryCache, InMemoryResultStore, ResultStore};
use std::sync::Arc;
use std::time::Duration;

fn result(id: &str, topic: &str, minutes: i64) -> GenerationResult {
    GenerationResult {
        id: id.to_string(),
        topic: topic.to_string(),
        topic_source: TopicSource::Inferred,
        topic_confidence: 0.6,
        summary: format!("summary of {}", id),
        key_points: vec![],
        flashcards: vec![],
        quiz: vec![],
        meta: ResultMeta {
            model: "m".to_string(),
            provider: "p".to_string(),
            processing_ms: 5,
        },
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
            + ChronoDuration::minutes(minutes),
    }
}

#[tokio::test]
async fn stored_result_round_trips_through_dyn_store() {
    let store: Arc<dyn ResultStore> = Arc::new(InMemoryResultStore::new());
    let generated = result("r1", "Biology", 0);
    let record = StoredRecord::from_parts(&GenerationRequest::new("cells"), &generated).unwrap();

    store.save(&record).await.unwrap();
    let fetched = store.get("r1").await.unwrap();

    assert_eq!(fetched.decode_result().unwrap(), generated);
    assert_eq!(fetched.request["text"], "cells");
}

#[tokio::test]
async fn concurrent_saves_with_same_id_leave_one_record() {
    let store = Arc::new(InMemoryResultStore::new());
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let generated = result("shared", &format!("topic-{}", i), 0);
            let record =
                StoredRecord::from_parts(&GenerationRequest::new("x"), &generated).unwrap();
            store.save(&record).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len(), 1);
    let stored = store.get("shared").await.unwrap();
    assert!(stored.topic.starts_with("topic-"));
}

#[tokio::test]
async fn not_found_is_distinguished_from_other_failures() {
    let store: Arc<dyn ResultStore> = Arc::new(InMemoryResultStore::new());
    let err = store.get("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn cache_contract_through_trait_object() {
    let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new(Duration::from_secs(60)));

    cache
        .set("k", "v".to_string(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(cache.get("k").await.unwrap(), "v");

    tokio::time::advance(Duration::from_millis(150)).await;

    assert_eq!(cache.get("k").await.unwrap_err().kind(), ErrorKind::NotFound);
    assert!(!cache.exists("k").await.unwrap());

    cache.close().await.unwrap();
}
