//! Health and readiness endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub available_tools: Vec<String>,
    pub registered_agents: usize,
    pub active_sessions: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = ServerStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        available_tools: state.service.tools.names(),
        registered_agents: state.service.agents.len().await,
        active_sessions: state.service.sessions.len().await,
    };
    (StatusCode::OK, Json(status))
}

/// `GET /health/live`
pub async fn live() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// `GET /health/ready`
///
/// Ready once at least one agent and one tool are registered.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let agents = state.service.agents.len().await;
    let tools = state.service.tools.len();

    if agents > 0 && tools > 0 {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "agents": agents,
                "tools": tools,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "agents": agents,
                "tools": tools,
            })),
        )
    }
}
