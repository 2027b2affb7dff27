//! Tracing subscriber initialization

use learnforge_core::{LearnforgeError, LearnforgeResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter
/// directive. Call once at startup.
pub fn init_tracing(level: &str, format: LogFormat) -> LearnforgeResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| LearnforgeError::internal(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(level, format = ?format, "Tracing initialized");
    Ok(())
}
