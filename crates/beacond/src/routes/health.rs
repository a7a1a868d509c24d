//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    node_id: u64,
    known_nodes: usize,
    peers: usize,
    uptime_secs: u64,
}

/// Basic health check (is the daemon running, how big is its view?)
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        node_id: state.node_id.value(),
        known_nodes: state.discovery.table().len(),
        peers: state.config.beacon.peers.len(),
        uptime_secs: state.uptime_secs(),
    })
}
