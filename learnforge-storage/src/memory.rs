//! In-process result store.

use crate::ResultStore;
use async_trait::async_trait;
use learnforge_core::{LearnforgeResult, StorageError, StoredRecord, Timestamp};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Result store backed by a `HashMap` under a single read/write lock.
///
/// Nothing survives a restart. Range scans are not snapshot-isolated
/// against concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultStore {
    records: Arc<RwLock<HashMap<String, StoredRecord>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect_newest_first<F>(&self, filter: F) -> Result<Vec<StoredRecord>, StorageError>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<StoredRecord> =
            records.values().filter(|r| filter(r)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(&self, record: &StoredRecord) -> LearnforgeResult<()> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut record = record.clone();
        if let Some(existing) = records.get(&record.id) {
            record.created_at = existing.created_at;
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> LearnforgeResult<StoredRecord> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        records.get(id).cloned().ok_or_else(|| {
            StorageError::NotFound {
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn get_by_topic(&self, topic: &str, limit: usize) -> LearnforgeResult<Vec<StoredRecord>> {
        let mut matched = self.collect_newest_first(|r| r.topic == topic)?;
        matched.truncate(limit);
        Ok(matched)
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> LearnforgeResult<Vec<StoredRecord>> {
        Ok(self.collect_newest_first(|r| r.created_at >= start && r.created_at < end)?)
    }

    async fn close(&self) -> LearnforgeResult<()> {
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use learnforge_core::{ErrorKind, TopicSource};
    use serde_json::json;

    fn record(id: &str, topic: &str, minutes: i64) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            request: json!({"text": "t"}),
            result: json!({"id": id}),
            topic: topic.to_string(),
            topic_source: TopicSource::Inferred,
            topic_confidence: 0.5,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryResultStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let store = InMemoryResultStore::new();
        let first = record("a", "Biology", 0);
        store.save(&first).await.unwrap();

        let mut second = record("a", "Chemistry", 30);
        second.result = json!({"id": "a", "version": 2});
        second.topic_source = TopicSource::User;
        store.save(&second).await.unwrap();

        let stored = store.get("a").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(stored.topic, "Chemistry");
        assert_eq!(stored.topic_source, TopicSource::User);
        assert_eq!(stored.result["version"], 2);
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_get_by_topic_newest_first_with_limit() {
        let store = InMemoryResultStore::new();
        for (id, minutes) in [("a", 0), ("b", 10), ("c", 20), ("d", 30)] {
            store.save(&record(id, "Biology", minutes)).await.unwrap();
        }
        store.save(&record("x", "Physics", 40)).await.unwrap();

        let found = store.get_by_topic("Biology", 3).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b"]);

        assert!(store.get_by_topic("biology", 10).await.unwrap().is_empty());
        assert!(store.get_by_topic("Biology", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_range_is_half_open() {
        let store = InMemoryResultStore::new();
        for (id, minutes) in [("before", -1), ("start", 0), ("inside", 30), ("end", 60)] {
            store.save(&record(id, "T", minutes)).await.unwrap();
        }

        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = start + Duration::minutes(60);
        let found = store.get_by_date_range(start, end).await.unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "start"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryResultStore::new();
        let handle = store.clone();
        handle.save(&record("a", "T", 0)).await.unwrap();
        assert!(store.get("a").await.is_ok());
        assert!(store.close().await.is_ok());
    }
}
