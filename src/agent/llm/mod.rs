//! Model client adapter: trait, streaming types and delta accumulation
//!
//! The orchestrator talks to the remote completion API through the
//! [`ModelClient`] trait only; the concrete OpenAI-compatible implementation
//! lives in [`openai`].

mod openai;

pub use openai::OpenAiClient;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::domain::{Message, ToolCallRequest, ToolDefinition};
use super::error::{ModelError, ModelResult};

/// One completion request: full ordered history plus published tools
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// One streamed chunk of a completion response
#[derive(Debug, Clone, Default)]
pub struct StreamChunk {
    /// Delta text content
    pub content: String,
    /// Partial tool call updates
    pub tool_calls: Vec<ToolCallDelta>,
    /// Present on the final chunk
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }
}

/// Incremental update for one tool call slot in a streamed response
#[derive(Debug, Clone, Default)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    /// Partial JSON arguments, accumulated across deltas
    pub arguments: Option<String>,
}

/// Builds complete [`ToolCallRequest`]s from streamed deltas
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: Vec<SlotBuilder>,
}

#[derive(Debug, Default)]
struct SlotBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &ToolCallDelta) {
        while self.slots.len() <= delta.index {
            self.slots.push(SlotBuilder::default());
        }
        let slot = &mut self.slots[delta.index];
        if let Some(id) = &delta.id {
            slot.id.push_str(id);
        }
        if let Some(name) = &delta.name {
            slot.name.push_str(name);
        }
        if let Some(arguments) = &delta.arguments {
            slot.arguments.push_str(arguments);
        }
    }

    /// Finished requests; slots without an id and name are discarded
    pub fn build(self) -> Vec<ToolCallRequest> {
        self.slots
            .into_iter()
            .filter(|s| !s.id.is_empty() && !s.name.is_empty())
            .map(|s| ToolCallRequest {
                id: s.id,
                name: s.name,
                arguments: serde_json::from_str(&s.arguments)
                    .unwrap_or(Value::Object(Default::default())),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Streamed completion response
pub struct ModelStream {
    receiver: mpsc::Receiver<ModelResult<StreamChunk>>,
}

impl ModelStream {
    pub fn channel(buffer: usize) -> (ModelStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (ModelStreamSender { sender: tx }, Self { receiver: rx })
    }
}

impl Stream for ModelStream {
    type Item = ModelResult<StreamChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sender half used by model client implementations
#[derive(Clone)]
pub struct ModelStreamSender {
    sender: mpsc::Sender<ModelResult<StreamChunk>>,
}

impl ModelStreamSender {
    pub async fn send(
        &self,
        chunk: StreamChunk,
    ) -> Result<(), mpsc::error::SendError<ModelResult<StreamChunk>>> {
        self.sender.send(Ok(chunk)).await
    }

    pub async fn send_error(
        &self,
        error: ModelError,
    ) -> Result<(), mpsc::error::SendError<ModelResult<StreamChunk>>> {
        self.sender.send(Err(error)).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The remote completion boundary
///
/// Implementations must not emit any observable output before the request is
/// known to have been accepted, so their internal retries stay idempotent
/// from the orchestrator's perspective.
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    /// Stream one completion for the given request
    fn complete_stream(&self, request: TurnRequest) -> ModelStream;
}
