//! Liveness listener
//!
//! A tiny HTTP endpoint reporting that the process is up, together with the
//! state of every stream. Recording does not depend on it.

use crate::recorder::{StatusBoard, StreamStatus};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Body of the liveness response
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub streams: Vec<StreamStatus>,
}

impl HealthReport {
    pub fn from_board(board: &StatusBoard) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            streams: board.snapshot(),
        }
    }
}

pub fn router(board: StatusBoard) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .with_state(board)
}

async fn health(State(board): State<StatusBoard>) -> Json<HealthReport> {
    Json(HealthReport::from_board(&board))
}

/// Listen on all interfaces at `port` until `cancel` fires.
///
/// A bind failure is logged; recording carries on without the listener.
pub async fn serve(port: u16, board: StatusBoard, cancel: CancellationToken) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to start liveness listener on {}: {}", addr, e);
            return;
        }
    };

    tracing::info!("Server started on http://localhost:{}", port);
    serve_on(listener, board, cancel).await;
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, board: StatusBoard, cancel: CancellationToken) {
    let result = axum::serve(listener, router(board))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await;

    if let Err(e) = result {
        tracing::error!("Liveness listener stopped: {}", e);
    }
}
