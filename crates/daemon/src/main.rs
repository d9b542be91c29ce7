// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojd`: the Odd Jobs Coordinator daemon entrypoint.

use std::sync::Arc;

use oj_core::SystemClock;
use oj_daemon::lifecycle::{LifecycleReaper, ReaperConfig};
use oj_daemon::{server, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let listen_addr = config.listen_addr.clone();
    let reaper_interval = config.reaper_interval;
    let stale_after = config.worker_stale_after;
    let remove_after = config.worker_remove_after;

    let pool = oj_storage::connect(&config.db_path).await?;
    let store = Arc::new(oj_storage::SessionStore::new(pool));

    let state = AppState::new(store, SystemClock, config);

    let reaper = Arc::new(LifecycleReaper::new(
        state.registry.clone(),
        state.queue.clone(),
        state.orchestrator.clone(),
        ReaperConfig { tick_interval: reaper_interval, stale_after, remove_after },
    ));
    let reaper_handle = reaper.spawn();

    let app = server::build(state);
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(%listen_addr, "ojd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper_handle.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("ojd shutting down");
}
