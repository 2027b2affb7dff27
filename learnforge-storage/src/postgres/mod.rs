//! PostgreSQL result store
//!
//! Connection pooling through deadpool-postgres. The schema is owned by
//! [`migrations`] and brought up to date on connect.

pub mod migrations;

pub use migrations::{run_migrations, Migration, MigrationTarget, LEDGER_SQL, MIGRATIONS};

use crate::ResultStore;
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use learnforge_core::{LearnforgeResult, StorageError, StoredRecord, Timestamp, TopicSource};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "learnforge".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> Result<Pool, StorageError> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size.max(1));
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::ConnectionFailed {
                reason: format!("Failed to create pool: {}", e),
            })
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn query_failed(e: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        reason: e.to_string(),
    }
}

// ============================================================================
// RESULT STORE
// ============================================================================

const SELECT_COLUMNS: &str =
    "id, request_json, response_json, topic, topic_source, topic_confidence, created_at";

/// Durable result store over a deadpool connection pool.
#[derive(Clone)]
pub struct PostgresResultStore {
    pool: Pool,
}

impl PostgresResultStore {
    /// Wrap an existing pool. Does not run migrations.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the pool and bring the schema up to date.
    pub async fn connect(config: &DbConfig) -> LearnforgeResult<Self> {
        let store = Self::new(config.create_pool()?);
        let applied = store.migrate().await?;
        tracing::info!(
            host = %config.host,
            dbname = %config.dbname,
            migrations_applied = applied.len(),
            "Connected to PostgreSQL result store"
        );
        Ok(store)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> LearnforgeResult<Vec<i32>> {
        let mut conn = self.get_conn().await?;
        let mut target = PgMigrationTarget { conn: &mut conn };
        run_migrations(&mut target, MIGRATIONS).await
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> Result<Object, StorageError> {
        if self.pool.is_closed() {
            return Err(StorageError::Closed);
        }
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })
    }

    fn row_to_record(row: &Row) -> Result<StoredRecord, StorageError> {
        let topic_source: String = row.try_get("topic_source").map_err(query_failed)?;
        Ok(StoredRecord {
            id: row.try_get("id").map_err(query_failed)?,
            request: row.try_get("request_json").map_err(query_failed)?,
            result: row.try_get("response_json").map_err(query_failed)?,
            topic: row.try_get("topic").map_err(query_failed)?,
            topic_source: TopicSource::from_provider(&topic_source),
            topic_confidence: row.try_get("topic_confidence").map_err(query_failed)?,
            created_at: row.try_get("created_at").map_err(query_failed)?,
        })
    }

    fn rows_to_records(rows: &[Row]) -> Result<Vec<StoredRecord>, StorageError> {
        rows.iter().map(Self::row_to_record).collect()
    }
}

impl std::fmt::Debug for PostgresResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresResultStore")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    async fn save(&self, record: &StoredRecord) -> LearnforgeResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO processed_results \
                 (id, request_json, response_json, topic, topic_source, topic_confidence, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                 request_json = EXCLUDED.request_json, \
                 response_json = EXCLUDED.response_json, \
                 topic = EXCLUDED.topic, \
                 topic_source = EXCLUDED.topic_source, \
                 topic_confidence = EXCLUDED.topic_confidence",
            &[
                &record.id,
                &record.request,
                &record.result,
                &record.topic,
                &record.topic_source.as_str(),
                &record.topic_confidence,
                &record.created_at,
            ],
        )
        .await
        .map_err(query_failed)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> LearnforgeResult<StoredRecord> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM processed_results WHERE id = $1", SELECT_COLUMNS);
        let row = conn
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(query_failed)?;

        match row {
            Some(row) => Ok(Self::row_to_record(&row)?),
            None => Err(StorageError::NotFound { id: id.to_string() }.into()),
        }
    }

    async fn get_by_topic(&self, topic: &str, limit: usize) -> LearnforgeResult<Vec<StoredRecord>> {
        let conn = self.get_conn().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {} FROM processed_results WHERE topic = $1 \
             ORDER BY created_at DESC LIMIT $2",
            SELECT_COLUMNS
        );
        let rows = conn
            .query(sql.as_str(), &[&topic, &limit])
            .await
            .map_err(query_failed)?;
        Ok(Self::rows_to_records(&rows)?)
    }

    async fn get_by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> LearnforgeResult<Vec<StoredRecord>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM processed_results \
             WHERE created_at >= $1 AND created_at < $2 \
             ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows = conn
            .query(sql.as_str(), &[&start, &end])
            .await
            .map_err(query_failed)?;
        Ok(Self::rows_to_records(&rows)?)
    }

    async fn close(&self) -> LearnforgeResult<()> {
        self.pool.close();
        Ok(())
    }
}

// ============================================================================
// MIGRATION TARGET
// ============================================================================

/// Applies migrations over one pooled connection.
struct PgMigrationTarget<'a> {
    conn: &'a mut Object,
}

#[async_trait]
impl MigrationTarget for PgMigrationTarget<'_> {
    async fn ensure_ledger(&mut self) -> Result<(), StorageError> {
        self.conn.batch_execute(LEDGER_SQL).await.map_err(query_failed)
    }

    async fn applied_versions(&mut self) -> Result<BTreeSet<i32>, StorageError> {
        let rows = self
            .conn
            .query("SELECT version FROM schema_migrations", &[])
            .await
            .map_err(query_failed)?;
        rows.iter()
            .map(|row| row.try_get::<_, i32>(0).map_err(query_failed))
            .collect()
    }

    async fn apply(&mut self, migration: &Migration) -> Result<(), StorageError> {
        let tx = self.conn.transaction().await.map_err(query_failed)?;
        tx.batch_execute(migration.up_sql).await.map_err(query_failed)?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES ($1)",
            &[&migration.version],
        )
        .await
        .map_err(query_failed)?;
        tx.commit().await.map_err(query_failed)
    }
}
