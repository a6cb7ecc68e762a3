//! Transport-agnostic chat request/response surface

use serde::{Deserialize, Serialize};

use super::ToolCallInfo;

fn default_agent_name() -> String {
    "default".to_string()
}

fn default_parallel_tools() -> bool {
    true
}

/// One chat turn request, shared by every transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Discard prior session messages before appending this one
    #[serde(default)]
    pub reset_history: bool,
    /// When false the tool executor's concurrency bound is forced to 1 for
    /// this turn only
    #[serde(default = "default_parallel_tools")]
    pub parallel_tools: bool,
    /// Opaque user identifier scoping the conversation session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Explicit session key within the user scope; defaults to the agent name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent_name: default_agent_name(),
            reset_history: false,
            parallel_tools: true,
            user_id: None,
            session_id: None,
        }
    }

    /// Session store key for this request
    pub fn session_scope(&self) -> String {
        let user = self.user_id.as_deref().unwrap_or("anonymous");
        let session = self.session_id.as_deref().unwrap_or(&self.agent_name);
        format!("{}/{}", user, session)
    }
}

/// Buffered response of the non-streaming chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallInfo>,
}
