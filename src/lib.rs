//! # Colloquy
//!
//! A streaming conversational agent backend. One HTTP server hosts:
//!
//! - a chat core that drives a model completion loop with tool calling,
//!   bounded tool concurrency and per-call timeouts
//! - two transports over the same event sequence: one-shot SSE streaming
//!   and a duplex WebSocket that multiplexes turns
//! - registries for named agent configurations and executable tools
//!
//! ## Architecture
//!
//! - `agent/` - the execution core (orchestrator, executor, model client)
//! - `adapters/` - HTTP transport adapters, pure event consumers
//! - `config/` - file + environment configuration

pub mod adapters;
pub mod agent;
pub mod cli;
pub mod config;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::{agents_api, chat_handler, health_handler, ws_handler};
use crate::agent::AgentService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AgentService>,
    pub started_at: Instant,
}

/// Assemble the application router over a constructed agent service
pub fn create_app(service: Arc<AgentService>) -> Router {
    let state = AppState {
        service,
        started_at: Instant::now(),
    };

    Router::new()
        .route("/health", get(health_handler::health))
        .route("/health/live", get(health_handler::live))
        .route("/health/ready", get(health_handler::ready))
        .route("/chat", post(chat_handler::chat))
        .route("/chat/stream", post(chat_handler::chat_stream))
        .route("/ws", get(ws_handler::ws_upgrade))
        .route("/agents", get(agents_api::list_agents))
        .route("/agents/:name", post(agents_api::register_agent))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
