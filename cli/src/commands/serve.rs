// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `addsvc serve`: HTTP server over the in-memory store.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use addsvc_core::infrastructure::repositories::InMemoryToDoStore;
use addsvc_core::presentation::router;
use addsvc_core::{AddService, BasicService, EndpointSet, ServiceConfig};

pub async fn run(config: ServiceConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    serve(listener, &config, InMemoryToDoStore::new(), shutdown_signal()).await
}

/// Serve the decorated endpoint set on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    config: &ServiceConfig,
    store: InMemoryToDoStore,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let svc: Arc<dyn AddService> = Arc::new(BasicService::new(Arc::new(store)));
    let app = router(EndpointSet::new(svc, &config.endpoints)).context("Failed to build routes")?;

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(%addr, "addsvc listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("addsvc shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
