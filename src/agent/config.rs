//! Agent configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{AgentError, AgentResult};

/// Configuration for one named agent
///
/// Immutable once registered; registering the same name again replaces the
/// prior entry wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent name, the key in the agent registry
    #[serde(default)]
    pub name: String,
    /// System instructions prepended to every model request
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Model identifier passed through to the completion API
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound on concurrently executing tool calls within one batch
    #[serde(default = "default_max_parallel_tools")]
    pub max_parallel_tools: usize,
    /// Hard per-call deadline for tool execution, in seconds
    #[serde(default = "default_tool_call_timeout")]
    pub tool_call_timeout_secs: u64,
    /// Maximum model/tool rounds in one turn before finalization is forced
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_instructions() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_max_parallel_tools() -> usize {
    5
}

fn default_tool_call_timeout() -> u64 {
    30
}

fn default_max_rounds() -> u32 {
    8
}

impl AgentConfig {
    /// The per-call tool deadline as a [`Duration`]
    pub fn tool_call_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_call_timeout_secs)
    }

    /// Validate invariants the rest of the system relies on
    pub fn validate(&self) -> AgentResult<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Configuration(
                "agent name must not be empty".to_string(),
            ));
        }
        if self.max_parallel_tools == 0 {
            return Err(AgentError::Configuration(format!(
                "agent '{}': max_parallel_tools must be at least 1",
                self.name
            )));
        }
        if self.tool_call_timeout_secs == 0 {
            return Err(AgentError::Configuration(format!(
                "agent '{}': tool_call_timeout_secs must be at least 1",
                self.name
            )));
        }
        if self.max_rounds == 0 {
            return Err(AgentError::Configuration(format!(
                "agent '{}': max_rounds must be at least 1",
                self.name
            )));
        }
        Ok(())
    }

    /// The agent registered at startup when none are configured
    pub fn default_assistant() -> Self {
        Self {
            name: "default".to_string(),
            instructions: "You are a helpful assistant with access to tools. \
                           Use them when they help answer the user's question."
                .to_string(),
            model: default_model(),
            max_parallel_tools: default_max_parallel_tools(),
            tool_call_timeout_secs: default_tool_call_timeout(),
            max_rounds: default_max_rounds(),
        }
    }
}
