//! LearnForge Storage - Result Store and Cache
//!
//! Persistence of generation outcomes behind [`ResultStore`], with an
//! in-process map and a PostgreSQL implementation, plus the TTL cache used
//! to memoize derived aggregates.

use async_trait::async_trait;
use learnforge_core::{LearnforgeResult, StoredRecord, Timestamp};

pub mod cache;
mod memory;
pub mod postgres;

pub use cache::{CacheBackend, CacheStats, InMemoryCache};
pub use memory::InMemoryResultStore;
pub use postgres::{
    run_migrations, DbConfig, Migration, MigrationTarget, PostgresResultStore, MIGRATIONS,
};

// ============================================================================
// RESULT STORE TRAIT
// ============================================================================

/// Persistence of generation outcomes.
///
/// Implementations must be thread-safe (Send + Sync). Queries returning
/// several records order them newest first.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert or replace the record with the same id.
    ///
    /// Replacing overwrites payloads and denormalized topic fields; the
    /// original creation time is kept.
    async fn save(&self, record: &StoredRecord) -> LearnforgeResult<()>;

    /// Fetch one record.
    ///
    /// # Returns
    /// * `Err(StorageError::NotFound)` - If no record has this id
    async fn get(&self, id: &str) -> LearnforgeResult<StoredRecord>;

    /// Most recent records with exactly this topic, at most `limit`.
    async fn get_by_topic(&self, topic: &str, limit: usize) -> LearnforgeResult<Vec<StoredRecord>>;

    /// Records created in `[start, end)`.
    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> LearnforgeResult<Vec<StoredRecord>>;

    /// Release underlying resources.
    async fn close(&self) -> LearnforgeResult<()>;
}
