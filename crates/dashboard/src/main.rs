// Rust guideline compliant 2026-10-18

//! Live model monitor entry point.
//!
//! Builds the model manager, the bounded history and the background updater,
//! then serves the HTTP API until CTRL+C.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin dashboard
//!
//! # Per-tick and per-epoch events
//! RUST_LOG=debug cargo run --bin dashboard
//!
//! # Another port, faster updates
//! MONITOR_BIND_ADDR=127.0.0.1:8080 MONITOR_UPDATE_INTERVAL_SECS=1 cargo run --bin dashboard
//! ```

use anyhow::Context as _;
use dashboard::{AppContext, DashboardConfig, RingHistory, router};
use modelizer::{ManagerConfig, ModelManager};
use network::{NetworkTrainer, TrainerConfig};
use tokio::sync::watch;
use updater::{Updater, UpdaterConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DashboardConfig::from_env().context("failed to read dashboard configuration")?;

    let trainer = NetworkTrainer::new(TrainerConfig::builder().build().context("failed to build trainer config")?);
    let manager_config = ManagerConfig::builder().build().context("failed to build manager config")?;
    let ctx = AppContext::new(
        ModelManager::new(trainer, manager_config),
        RingHistory::new(),
    );

    let updater_config = UpdaterConfig::builder()
        .interval(config.update_interval)
        .build()
        .context("failed to build updater config")?;
    let updater = Updater::new(updater_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let background = {
        let ctx = ctx.clone();
        tokio::spawn(async move { updater.run(&*ctx.manager, &*ctx.history, shutdown_rx).await })
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "dashboard.listening");

    // CTRL+C: stop accepting requests, drain in-flight ones, stop the updater.
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "dashboard.shutdown: ctrl_c listener failed");
            }
            tracing::info!("dashboard.shutdown: ctrl_c received");
            if shutdown_tx.send(true).is_err() {
                tracing::debug!("dashboard.shutdown: updater already stopped");
            }
        })
        .await
        .context("http server failed")?;

    let appended = background.await.context("updater task panicked")?;
    tracing::info!(appended, "dashboard.stopped");
    Ok(())
}
