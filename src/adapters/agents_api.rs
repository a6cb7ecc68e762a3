//! Agent configuration endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::ApiError;
use crate::agent::AgentConfig;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AgentList {
    pub agents: Vec<AgentConfig>,
    pub count: usize,
}

/// `GET /agents`: registered configurations; no field is secret
pub async fn list_agents(State(state): State<AppState>) -> Json<AgentList> {
    let agents = state.service.agents.list().await;
    let count = agents.len();
    Json(AgentList { agents, count })
}

/// `POST /agents/{name}`: register or replace a configuration
///
/// The path segment is authoritative for the name; a `name` in the body is
/// ignored.
pub async fn register_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut config): Json<AgentConfig>,
) -> Result<Json<Value>, ApiError> {
    config.name = name.clone();
    state.service.agents.register(config).await?;

    Ok(Json(json!({
        "message": format!("Agent '{}' registered", name),
        "available_tools": state.service.tools.names(),
    })))
}
