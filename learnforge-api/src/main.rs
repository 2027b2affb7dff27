//! LearnForge API Server Entry Point
//!
//! Loads configuration, builds the configured store and provider, and
//! serves HTTP until interrupted.

use learnforge_api::{create_router, init_tracing, AppConfig, AppState};
use learnforge_core::{LearnforgeError, LearnforgeResult};

#[tokio::main]
async fn main() -> LearnforgeResult<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.log_level, config.log_format)?;
    config.validate()?;

    let state = AppState::from_config(&config).await?;
    let app = create_router(state.clone());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LearnforgeError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Starting LearnForge API server");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LearnforgeError::internal(format!("Server error: {}", e)));

    state.shutdown().await;
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
