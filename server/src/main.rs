//! Courtside reservation HTTP server.
//!
//! Wires the `PostgreSQL` store, the court locker and the admission service
//! behind the Axum router, with a separate Prometheus scrape listener.

mod config;

use anyhow::Context;
use axum::{Router, routing::get};
use config::Config;
use courtside_core::SystemClock;
use courtside_postgres::PostgresReservationStore;
use courtside_runtime::{
    AdmissionConfig, LocalLocker, ReservationService, ResourceLocker, ShardedLocker,
    metrics::MetricsServer,
};
use courtside_web::{AppState, build_router, handlers::health};
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtside=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Courtside reservation server");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        bind = %config.server.bind_addr(),
        metrics = %config.server.metrics_addr(),
        lock_shards = config.reservations.lock_shards,
        lock_wait = ?config.reservations.lock_wait,
        "Configuration loaded"
    );

    info!("Connecting to reservation database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.connect_timeout)
        .connect(&config.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let store = Arc::new(PostgresReservationStore::from_pool(pool));
    info!("Reservation database connected");

    let metrics_addr = config
        .server
        .metrics_addr()
        .parse()
        .context("invalid metrics address")?;
    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start().context("failed to install metrics recorder")?;

    let service = ReservationService::new(
        store,
        build_locker(config.reservations.lock_shards),
        Arc::new(SystemClock),
        admission_config(&config),
    );

    let mut state = AppState::new(service);
    if let Some(handle) = metrics.handle() {
        state = state.with_metrics(handle.clone());
    }

    spawn_metrics_listener(metrics.addr(), state.clone()).await?;

    let app = build_router(state);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    let draining = Arc::new(Notify::new());
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown({
            let draining = Arc::clone(&draining);
            async move {
                shutdown_signal().await;
                draining.notify_one();
            }
        })
        .into_future();

    let drain_limit = config.server.shutdown_timeout;
    tokio::select! {
        result = serve => result.context("server error")?,
        () = async {
            draining.notified().await;
            tokio::time::sleep(drain_limit).await;
        } => {
            warn!(timeout_secs = drain_limit.as_secs(), "Shutdown timeout elapsed, dropping open connections");
        }
    }

    info!("Server stopped");
    Ok(())
}

fn build_locker(shards: usize) -> Arc<dyn ResourceLocker> {
    if shards == 0 {
        info!("Using per-court lock table");
        Arc::new(LocalLocker::new())
    } else {
        info!(shards, "Using sharded court locks");
        Arc::new(ShardedLocker::new(shards))
    }
}

fn admission_config(config: &Config) -> AdmissionConfig {
    match config.reservations.lock_wait {
        Some(limit) => AdmissionConfig::new().with_lock_wait_limit(limit),
        None => AdmissionConfig::new(),
    }
}

/// Serve `/metrics` on its own listener so scraping stays off the API port.
async fn spawn_metrics_listener(
    addr: std::net::SocketAddr,
    state: AppState,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener {addr}"))?;
    let app = Router::new()
        .route("/metrics", get(health::metrics))
        .with_state(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics listener failed");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
