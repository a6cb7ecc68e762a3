//! Tool call requests, lifecycle records and definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the model
///
/// The id is unique within the completion response that produced it and is
/// the correlation key for all downstream lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Lifecycle state of one tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

/// Lifecycle record for one tool call
///
/// Mutated in place as the call progresses; exactly one terminal state
/// (`Completed` or `Failed`) is reached per started call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallInfo {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolCallInfo {
    /// Record for a call that has begun executing
    pub fn executing(request: &ToolCallRequest) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            arguments: request.arguments.clone(),
            status: ToolCallStatus::Executing,
            result: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Record for a call that failed before execution started
    pub fn rejected(request: &ToolCallRequest, error: impl Into<String>) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            arguments: request.arguments.clone(),
            status: ToolCallStatus::Failed,
            result: None,
            error: Some(error.into()),
            duration_ms: None,
        }
    }

    pub fn complete(&mut self, result: impl Into<String>, duration_ms: u64) {
        self.status = ToolCallStatus::Completed;
        self.result = Some(result.into());
        self.duration_ms = Some(duration_ms);
    }

    pub fn fail(&mut self, error: impl Into<String>, duration_ms: u64) {
        self.status = ToolCallStatus::Failed;
        self.error = Some(error.into());
        self.duration_ms = Some(duration_ms);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ToolCallStatus::Completed | ToolCallStatus::Failed
        )
    }

    /// The text fed back to the model as this call's output
    ///
    /// Failures are reported as the tool's output, not as run errors, so the
    /// model can react to them.
    pub fn feedback_text(&self) -> String {
        match self.status {
            ToolCallStatus::Completed => self.result.clone().unwrap_or_default(),
            _ => serde_json::json!({
                "error": self.error.as_deref().unwrap_or("tool execution failed"),
            })
            .to_string(),
        }
    }
}

/// Capability descriptor published to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_transitions() {
        let request = ToolCallRequest::new("call_1", "get_weather", json!({"city": "Tokyo"}));

        let mut info = ToolCallInfo::executing(&request);
        assert!(!info.is_terminal());

        info.complete("sunny", 12);
        assert!(info.is_terminal());
        assert_eq!(info.status, ToolCallStatus::Completed);
        assert_eq!(info.feedback_text(), "sunny");
    }

    #[test]
    fn failure_feedback_is_structured() {
        let request = ToolCallRequest::new("call_2", "missing", json!({}));
        let info = ToolCallInfo::rejected(&request, "tool not found");

        assert!(info.is_terminal());
        let parsed: Value = serde_json::from_str(&info.feedback_text()).expect("json feedback");
        assert_eq!(parsed["error"], "tool not found");
    }
}
