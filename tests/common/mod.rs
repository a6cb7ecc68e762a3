//! Shared test doubles: a scripted model client and side-effect tools

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use colloquy::agent::domain::ToolDefinition;
use colloquy::agent::llm::{
    FinishReason, ModelClient, ModelStream, StreamChunk, ToolCallDelta, TurnRequest,
};
use colloquy::agent::tools::{ToolHandler, ToolRegistry, ToolRegistryBuilder};
use colloquy::agent::{
    AgentConfig, AgentRegistry, AgentService, ModelError, SessionStore,
};

/// One scripted completion round
pub enum ScriptedTurn {
    /// Final text, streamed as two chunks
    Text(String),
    /// Tool call requests: (id, name, arguments)
    ToolCalls(Vec<(String, String, Value)>),
    /// Text content alongside tool calls
    TextAndToolCalls(String, Vec<(String, String, Value)>),
    /// Adapter failure surfaced on the stream
    Fail(String),
}

/// Model client double that replays a fixed script, one turn per request
pub struct ScriptedModel {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests_seen: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ScriptedTurn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests_seen: AtomicUsize::new(0),
        })
    }

    /// Number of completion requests the orchestrator has issued
    pub fn requests(&self) -> usize {
        self.requests_seen.load(Ordering::SeqCst)
    }
}

impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete_stream(&self, _request: TurnRequest) -> ModelStream {
        self.requests_seen.fetch_add(1, Ordering::SeqCst);
        let turn = self.turns.lock().unwrap().pop_front();
        let (sender, stream) = ModelStream::channel(16);

        tokio::spawn(async move {
            match turn {
                None => {
                    let _ = sender.send(StreamChunk::finish(FinishReason::Stop)).await;
                }
                Some(ScriptedTurn::Text(text)) => {
                    send_text(&sender, &text).await;
                    let _ = sender.send(StreamChunk::finish(FinishReason::Stop)).await;
                }
                Some(ScriptedTurn::ToolCalls(calls)) => {
                    send_tool_calls(&sender, calls).await;
                }
                Some(ScriptedTurn::TextAndToolCalls(text, calls)) => {
                    send_text(&sender, &text).await;
                    send_tool_calls(&sender, calls).await;
                }
                Some(ScriptedTurn::Fail(message)) => {
                    let _ = sender.send_error(ModelError::Network(message)).await;
                }
            }
        });

        stream
    }
}

async fn send_text(sender: &colloquy::agent::llm::ModelStreamSender, text: &str) {
    let mid = text.len() / 2;
    let (head, tail) = text.split_at(mid);
    if !head.is_empty() {
        let _ = sender.send(StreamChunk::text(head)).await;
    }
    if !tail.is_empty() {
        let _ = sender.send(StreamChunk::text(tail)).await;
    }
}

async fn send_tool_calls(
    sender: &colloquy::agent::llm::ModelStreamSender,
    calls: Vec<(String, String, Value)>,
) {
    for (index, (id, name, arguments)) in calls.into_iter().enumerate() {
        let chunk = StreamChunk {
            content: String::new(),
            tool_calls: vec![ToolCallDelta {
                index,
                id: Some(id),
                name: Some(name),
                arguments: Some(arguments.to_string()),
            }],
            finish_reason: None,
        };
        let _ = sender.send(chunk).await;
    }
    let _ = sender
        .send(StreamChunk::finish(FinishReason::ToolCalls))
        .await;
}

/// Tool that sleeps, then appends its label to a shared log
pub struct SideEffectTool {
    pub delay: Duration,
    pub label: String,
    pub log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ToolHandler for SideEffectTool {
    async fn call(&self, _args: Value) -> anyhow::Result<Value> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(self.label.clone());
        Ok(Value::String(format!("{} finished", self.label)))
    }
}

/// Tool that always fails
pub struct BoomTool;

#[async_trait]
impl ToolHandler for BoomTool {
    async fn call(&self, _args: Value) -> anyhow::Result<Value> {
        anyhow::bail!("boom")
    }
}

pub fn tool_definition(name: &str) -> ToolDefinition {
    ToolDefinition::new(name, "test tool", serde_json::json!({"type": "object"}))
}

/// Registry with a `lookup` side-effect tool and a failing `boom` tool
pub fn test_registry(delay: Duration, log: Arc<Mutex<Vec<String>>>) -> ToolRegistryBuilder {
    ToolRegistry::builder()
        .register(
            tool_definition("lookup"),
            Arc::new(SideEffectTool {
                delay,
                label: "lookup".to_string(),
                log,
            }),
        )
        .register(tool_definition("boom"), Arc::new(BoomTool))
}

pub fn agent_config(name: &str, max_parallel_tools: usize, timeout_secs: u64, max_rounds: u32) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        instructions: "You are a test assistant.".to_string(),
        model: "scripted-model".to_string(),
        max_parallel_tools,
        tool_call_timeout_secs: timeout_secs,
        max_rounds,
    }
}

/// Build a fully wired service over the given doubles
pub async fn service_with(
    model: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    configs: Vec<AgentConfig>,
) -> Arc<AgentService> {
    let agents = Arc::new(AgentRegistry::new());
    for config in configs {
        agents.register(config).await.expect("valid test config");
    }
    Arc::new(AgentService::new(
        agents,
        Arc::new(SessionStore::new()),
        Arc::new(tools),
        model,
    ))
}
