//! Liveness endpoint
//!
//! A trivial probe with no deep readiness semantics, plus the metrics
//! exposition. Runs as the only task concurrent with the watch loop.

use crate::metrics;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub async fn serve(addr: SocketAddr) {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(serve_metrics));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, "Failed to bind health listener: {e}");
            return;
        }
    };

    info!(%addr, "Health endpoint listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Health listener terminated: {e}");
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn serve_metrics() -> String {
    metrics::gather()
}
