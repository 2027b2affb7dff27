//! Forward-only schema migrations.
//!
//! A ledger table records applied versions. Each pending migration runs in
//! its own transaction together with its ledger insert, so a crash leaves
//! either both committed or neither.

mod v001_processed_results;

use async_trait::async_trait;
use learnforge_core::{LearnforgeResult, StorageError};
use std::collections::BTreeSet;

/// One schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub up_sql: &'static str,
}

/// Every known migration, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "processed_results",
    up_sql: v001_processed_results::MIGRATION_SQL,
}];

/// Ledger DDL.
pub const LEDGER_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Something migrations can be applied to.
#[async_trait]
pub trait MigrationTarget: Send {
    /// Create the version ledger if it does not exist.
    async fn ensure_ledger(&mut self) -> Result<(), StorageError>;

    /// Versions already recorded in the ledger.
    async fn applied_versions(&mut self) -> Result<BTreeSet<i32>, StorageError>;

    /// Run `migration` and record its version atomically.
    async fn apply(&mut self, migration: &Migration) -> Result<(), StorageError>;
}

/// Apply every migration not yet in the ledger, in version order.
///
/// Returns the versions applied by this call; empty when the schema is
/// already current. Stops at the first failure.
pub async fn run_migrations<T>(target: &mut T, migrations: &[Migration]) -> LearnforgeResult<Vec<i32>>
where
    T: MigrationTarget + ?Sized,
{
    target.ensure_ledger().await?;
    let applied = target.applied_versions().await?;

    let mut pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();
    pending.sort_by_key(|m| m.version);

    let mut newly_applied = Vec::with_capacity(pending.len());
    for migration in pending {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying schema migration"
        );
        target.apply(migration).await.map_err(|e| StorageError::MigrationFailed {
            version: migration.version,
            reason: e.to_string(),
        })?;
        newly_applied.push(migration.version);
    }

    if newly_applied.is_empty() {
        tracing::debug!("Schema is up to date");
    }
    Ok(newly_applied)
}
