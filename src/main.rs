//! presence-relay server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and REST endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use presence_relay::api;
use presence_relay::app_state::AppState;
use presence_relay::config::{LogFormat, PresenceConfig, StoreBackend};
use presence_relay::domain::Relay;
use presence_relay::persistence::{HistoryLog, MemoryHistory, MemoryStore, PostgresStore, SessionStore};
use presence_relay::service::PresenceRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = PresenceConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting presence-relay");

    // Build persistence layer
    let (store, history): (Arc<dyn SessionStore>, Arc<dyn HistoryLog>) = match &config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory session store; sessions are lost on restart");
            (Arc::new(MemoryStore::new()), Arc::new(MemoryHistory::new()))
        }
        StoreBackend::Postgres(db) => {
            let pg = PostgresStore::connect(db)
                .await
                .context("failed to connect to PostgreSQL")?;
            pg.migrate().await.context("failed to run migrations")?;
            let pg = Arc::new(pg);
            (Arc::<PostgresStore>::clone(&pg), pg)
        }
    };

    // Build service layer
    let mut registry = PresenceRegistry::new(store, Relay::new(config.relay_capacity))
        .with_inspector_client_types(config.inspector_client_types.clone())
        .with_disconnect_policy(config.disconnect_policy);
    if config.history_enabled {
        registry = registry.with_history(history);
    }

    // Build application state
    let app_state = AppState {
        registry: Arc::new(registry),
        error_event_name: Arc::from(config.error_event_name.as_str()),
    };

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
