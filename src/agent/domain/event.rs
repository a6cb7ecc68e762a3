//! Agent events and the channel-backed event stream

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{ChatResponse, ToolCallInfo};
use crate::agent::error::AgentError;

/// Wire-independent event produced by one agent run
///
/// Events are emitted in strict temporal order and never reordered
/// downstream; both transport adapters serialize this union as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial assistant text
    ChatChunk { content: String },
    /// A tool call has begun executing
    ToolCallStart { tool_call: ToolCallInfo },
    /// A tool call finished successfully
    ToolCallComplete { tool_call: ToolCallInfo },
    /// A tool call failed (execution error, timeout, or unknown tool)
    ToolCallError { tool_call: ToolCallInfo },
    /// The run finished with a final answer
    ChatComplete {
        final_response: String,
        total_tool_calls: usize,
    },
    /// The run failed; always the last event when present
    Error { message: String },
}

impl AgentEvent {
    pub fn chunk(content: impl Into<String>) -> Self {
        Self::ChatChunk {
            content: content.into(),
        }
    }

    pub fn tool_start(tool_call: &ToolCallInfo) -> Self {
        Self::ToolCallStart {
            tool_call: tool_call.clone(),
        }
    }

    pub fn tool_complete(tool_call: &ToolCallInfo) -> Self {
        Self::ToolCallComplete {
            tool_call: tool_call.clone(),
        }
    }

    pub fn tool_error(tool_call: &ToolCallInfo) -> Self {
        Self::ToolCallError {
            tool_call: tool_call.clone(),
        }
    }

    pub fn complete(final_response: impl Into<String>, total_tool_calls: usize) -> Self {
        Self::ChatComplete {
            final_response: final_response.into(),
            total_tool_calls,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this event ends the run's event sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ChatComplete { .. } | Self::Error { .. })
    }
}

/// Ordered event sequence of one agent run
pub struct AgentEventStream {
    receiver: mpsc::Receiver<AgentEvent>,
}

impl AgentEventStream {
    /// Create a sender/stream pair
    pub fn channel(buffer: usize) -> (AgentEventSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (AgentEventSender { sender: tx }, Self { receiver: rx })
    }

    /// Buffer the whole sequence into a [`ChatResponse`]
    ///
    /// Used by the non-streaming endpoint; an `Error` event becomes an `Err`.
    pub async fn into_response(mut self) -> Result<ChatResponse, AgentError> {
        let mut text = String::new();
        let mut final_response: Option<String> = None;
        let mut tool_calls: Vec<ToolCallInfo> = Vec::new();

        while let Some(event) = self.receiver.recv().await {
            match event {
                AgentEvent::ChatChunk { content } => text.push_str(&content),
                AgentEvent::ToolCallStart { tool_call } => tool_calls.push(tool_call),
                AgentEvent::ToolCallComplete { tool_call }
                | AgentEvent::ToolCallError { tool_call } => {
                    match tool_calls.iter_mut().find(|t| t.id == tool_call.id) {
                        Some(existing) => *existing = tool_call,
                        None => tool_calls.push(tool_call),
                    }
                }
                AgentEvent::ChatComplete { final_response: r, .. } => {
                    final_response = Some(r);
                }
                AgentEvent::Error { message } => {
                    return Err(AgentError::Execution(message));
                }
            }
        }

        Ok(ChatResponse {
            response: final_response.unwrap_or(text),
            tool_calls,
        })
    }
}

impl Stream for AgentEventStream {
    type Item = AgentEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sender half of an agent run's event sequence
///
/// A failed send means every consumer is gone; runs treat that as the
/// cooperative cancellation signal.
#[derive(Clone)]
pub struct AgentEventSender {
    sender: mpsc::Sender<AgentEvent>,
}

impl AgentEventSender {
    pub async fn send(&self, event: AgentEvent) -> Result<(), mpsc::error::SendError<AgentEvent>> {
        self.sender.send(event).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::domain::ToolCallRequest;
    use serde_json::json;

    #[test]
    fn events_serialize_with_tag() {
        let event = AgentEvent::chunk("hel");
        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(value["event_type"], "chat_chunk");
        assert_eq!(value["content"], "hel");

        let event = AgentEvent::complete("done", 2);
        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(value["event_type"], "chat_complete");
        assert_eq!(value["total_tool_calls"], 2);
    }

    #[tokio::test]
    async fn collect_prefers_final_response_and_tracks_tools() {
        let (sender, stream) = AgentEventStream::channel(16);
        let request = ToolCallRequest::new("call_1", "get_time", json!({}));
        let mut info = ToolCallInfo::executing(&request);

        sender.send(AgentEvent::chunk("partial")).await.expect("send");
        sender.send(AgentEvent::tool_start(&info)).await.expect("send");
        info.complete("12:30", 5);
        sender.send(AgentEvent::tool_complete(&info)).await.expect("send");
        sender.send(AgentEvent::complete("final answer", 1)).await.expect("send");
        drop(sender);

        let response = stream.into_response().await.expect("ok");
        assert_eq!(response.response, "final answer");
        assert_eq!(response.tool_calls.len(), 1);
        assert!(response.tool_calls[0].is_terminal());
    }

    #[tokio::test]
    async fn collect_turns_error_event_into_err() {
        let (sender, stream) = AgentEventStream::channel(4);
        sender.send(AgentEvent::error("model unreachable")).await.expect("send");
        drop(sender);

        assert!(stream.into_response().await.is_err());
    }
}
