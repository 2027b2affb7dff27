//! Cache backend trait and statistics.

use async_trait::async_trait;
use learnforge_core::LearnforgeResult;
use std::time::Duration;

/// Key/value cache with per-entry expiration.
///
/// Values are opaque strings; callers own their encoding. A TTL of `None`
/// or zero never expires.
///
/// # Failure Semantics
///
/// Callers treat every error as a miss and recompute from the source of
/// truth. A cache outage must never fail the caller's primary operation.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live value.
    ///
    /// # Returns
    /// * `Err(CacheError::NotFound)` - If the key is absent or expired
    async fn get(&self, key: &str) -> LearnforgeResult<String>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> LearnforgeResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> LearnforgeResult<()>;

    /// Whether a live value exists.
    async fn exists(&self, key: &str) -> LearnforgeResult<bool>;

    /// Get cache statistics.
    async fn stats(&self) -> LearnforgeResult<CacheStats>;

    /// Stop background work and reject further operations.
    async fn close(&self) -> LearnforgeResult<()>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, expired entries included.
    pub misses: u64,
    /// Number of entries currently held, expired-but-unswept included.
    pub entry_count: u64,
    /// Number of entries removed because they expired.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
