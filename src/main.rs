//! lootpot server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use lootpot::app_state::AppState;
use lootpot::config::{GatewayConfig, LogFormat};
use lootpot::persistence::{PostgresPersistence, spawn_event_log_writer};
use lootpot::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        oracle_mode = ?config.oracle_mode,
        owner = %config.registry_owner,
        randomness_provider = %config.randomness_provider,
        creation_fee = %config.creation_fee,
        "starting lootpot"
    );

    let pool_service = server::build_service(&config);

    let event_log = if config.persistence_enabled {
        let pg = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("failed to connect to PostgreSQL")?;
        let persistence = PostgresPersistence::new(pg);
        persistence
            .migrate()
            .await
            .context("failed to run migrations")?;
        tracing::info!("event log enabled");
        Some(spawn_event_log_writer(persistence, pool_service.event_bus()))
    } else {
        None
    };

    let sweeper = server::spawn_draw_sweeper(
        std::sync::Arc::clone(&pool_service),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let app = server::build_app(
        AppState::new(pool_service),
        Duration::from_secs(config.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    if let Some(handle) = event_log {
        handle.abort();
    }
    tracing::info!("shutdown complete");
    Ok(())
}
