//! Report Service
//!
//! Point queries for the external report generator. Daily summaries are
//! memoized in the cache; the cache is never required for a correct answer.

use chrono::{NaiveDate, NaiveTime};
use learnforge_core::{GenerationResult, LearnforgeError, LearnforgeResult, StoredRecord};
use learnforge_storage::{CacheBackend, ResultStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{SUMMARY_CACHE_PREFIX, SUMMARY_CACHE_TTL};
use crate::reporter::ErrorReporter;

// ============================================================================
// TYPES
// ============================================================================

/// Number of results generated for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Aggregate of one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_requests: usize,
    /// Sorted by descending count, then topic name.
    pub topics: Vec<TopicCount>,
}

impl DailySummary {
    pub fn from_records(date: NaiveDate, records: &[StoredRecord]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *counts.entry(record.topic.as_str()).or_default() += 1;
        }

        let mut topics: Vec<TopicCount> = counts
            .into_iter()
            .map(|(topic, count)| TopicCount {
                topic: topic.to_string(),
                count,
            })
            .collect();
        topics.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));

        Self {
            date,
            total_requests: records.len(),
            topics,
        }
    }
}

/// Cache key for a day's summary, e.g. `summary:2025-01-31`.
pub fn summary_cache_key(date: NaiveDate) -> String {
    format!("{}{}", SUMMARY_CACHE_PREFIX, date.format("%Y-%m-%d"))
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct ReportService {
    store: Arc<dyn ResultStore>,
    cache: Arc<dyn CacheBackend>,
    reporter: Arc<dyn ErrorReporter>,
    ttl: Duration,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn ResultStore>,
        cache: Arc<dyn CacheBackend>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            store,
            cache,
            reporter,
            ttl: SUMMARY_CACHE_TTL,
        }
    }

    /// Summary of every result created on `date` (UTC).
    ///
    /// Served from the cache when a decodable entry exists; otherwise
    /// computed from the store and written back. Only store failures fail
    /// the call.
    pub async fn daily_summary(&self, date: NaiveDate) -> LearnforgeResult<DailySummary> {
        let key = summary_cache_key(date);

        match self.cache.get(&key).await {
            Ok(cached) => match serde_json::from_str::<DailySummary>(&cached) {
                Ok(summary) => {
                    tracing::debug!(%key, "Daily summary served from cache");
                    return Ok(summary);
                }
                Err(e) => tracing::warn!(%key, error = %e, "Discarding undecodable cached summary"),
            },
            Err(err) if err.is_not_found() => {}
            Err(err) => tracing::warn!(%key, error = %err, "Cache read failed, recomputing"),
        }

        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);
        let records = self.store.get_by_date_range(start, end).await?;
        let summary = DailySummary::from_records(date, &records);

        match serde_json::to_string(&summary) {
            Ok(json) => {
                if let Err(err) = self.cache.set(&key, json, Some(self.ttl)).await {
                    self.reporter.report(&err, "daily summary cache write");
                }
            }
            Err(e) => self.reporter.report(
                &LearnforgeError::internal(format!("Failed to encode summary: {}", e)),
                "daily summary cache write",
            ),
        }

        tracing::info!(
            %date,
            total = summary.total_requests,
            topics = summary.topics.len(),
            "Computed daily summary"
        );
        Ok(summary)
    }

    /// Most recent results for a topic, newest first.
    pub async fn recent_by_topic(
        &self,
        topic: &str,
        limit: usize,
    ) -> LearnforgeResult<Vec<GenerationResult>> {
        let records = self.store.get_by_topic(topic, limit).await?;
        records
            .iter()
            .map(|record| record.decode_result().map_err(LearnforgeError::from))
            .collect()
    }
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnforge_test_utils::fixtures;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(summary_cache_key(date(2025, 1, 5)), "summary:2025-01-05");
    }

    #[test]
    fn test_topics_sorted_by_count_then_name() {
        let at = fixtures::noon(2025, 1, 5);
        let records = vec![
            fixtures::sample_record("1", "Physics", at),
            fixtures::sample_record("2", "Biology", at),
            fixtures::sample_record("3", "Physics", at),
            fixtures::sample_record("4", "Art", at),
        ];

        let summary = DailySummary::from_records(date(2025, 1, 5), &records);

        assert_eq!(summary.total_requests, 4);
        let order: Vec<(&str, usize)> = summary
            .topics
            .iter()
            .map(|t| (t.topic.as_str(), t.count))
            .collect();
        assert_eq!(order, vec![("Physics", 2), ("Art", 1), ("Biology", 1)]);
    }

    #[test]
    fn test_summary_wire_shape() {
        let at = fixtures::noon(2025, 1, 5);
        let summary =
            DailySummary::from_records(date(2025, 1, 5), &[fixtures::sample_record("1", "Art", at)]);

        let json = serde_json::to_value(&summary).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(keys, vec!["date", "topics", "total_requests"]);
        assert_eq!(json["date"], "2025-01-05");
        assert_eq!(json["topics"][0], serde_json::json!({"topic": "Art", "count": 1}));
    }

    #[test]
    fn test_empty_day() {
        let summary = DailySummary::from_records(date(2025, 1, 5), &[]);
        assert_eq!(summary.total_requests, 0);
        assert!(summary.topics.is_empty());
    }
}
