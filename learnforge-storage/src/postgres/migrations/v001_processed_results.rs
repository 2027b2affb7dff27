//! V001: processed_results table with topic and creation-time indexes.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS processed_results (
    id TEXT PRIMARY KEY,
    request_json JSONB NOT NULL,
    response_json JSONB NOT NULL,
    topic TEXT NOT NULL,
    topic_source TEXT NOT NULL,
    topic_confidence DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_processed_results_created_at
    ON processed_results(created_at);
CREATE INDEX IF NOT EXISTS idx_processed_results_topic
    ON processed_results(topic);
"#;
