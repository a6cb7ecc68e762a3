//! Entry point gluing registries, sessions and the model client together

use std::sync::Arc;

use super::domain::{AgentEventStream, ChatRequest, ChatResponse};
use super::error::{AgentError, AgentResult};
use super::llm::ModelClient;
use super::registry::AgentRegistry;
use super::run::AgentRun;
use super::session::SessionStore;
use super::tools::ToolRegistry;

/// Shared service constructing agent runs for the transport adapters
pub struct AgentService {
    pub agents: Arc<AgentRegistry>,
    pub sessions: Arc<SessionStore>,
    pub tools: Arc<ToolRegistry>,
    pub model: Arc<dyn ModelClient>,
}

impl AgentService {
    pub fn new(
        agents: Arc<AgentRegistry>,
        sessions: Arc<SessionStore>,
        tools: Arc<ToolRegistry>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            agents,
            sessions,
            tools,
            model,
        }
    }

    /// Start one chat turn, returning its event stream
    ///
    /// Fails fast when the agent name is unknown so transports can answer
    /// with a proper status instead of a stream.
    pub async fn start_turn(&self, request: ChatRequest) -> AgentResult<AgentEventStream> {
        let config = self
            .agents
            .resolve(&request.agent_name)
            .await
            .ok_or_else(|| AgentError::AgentNotFound(request.agent_name.clone()))?;

        tracing::info!(
            agent = %config.name,
            scope = %request.session_scope(),
            reset = request.reset_history,
            "Starting chat turn"
        );

        Ok(AgentRun::spawn(
            config,
            self.model.clone(),
            self.tools.clone(),
            self.sessions.clone(),
            request,
        ))
    }

    /// Run one turn to completion and buffer the result
    pub async fn chat(&self, request: ChatRequest) -> AgentResult<ChatResponse> {
        self.start_turn(request).await?.into_response().await
    }
}
