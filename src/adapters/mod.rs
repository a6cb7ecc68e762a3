//! Transport adapters and HTTP surface
//!
//! Thin consumers of the agent core: they serialize the event sequence to
//! the wire and never mutate session or registry state themselves.

pub mod agents_api;
pub mod chat_handler;
pub mod health_handler;
pub mod ws_handler;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::agent::AgentError;

/// HTTP-mapped error for the REST endpoints
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        let status = match &err {
            AgentError::AgentNotFound(_) => StatusCode::NOT_FOUND,
            AgentError::Configuration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
