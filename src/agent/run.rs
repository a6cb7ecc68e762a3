//! Agent run orchestration
//!
//! One [`AgentRun`] drives a single turn: append the user message, loop
//! between model completion and tool execution until the model produces a
//! final answer or the round limit forces finalization. The run owns its
//! session exclusively for the whole turn and is the sole producer of the
//! turn's event sequence.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::OwnedMutexGuard;

use super::config::AgentConfig;
use super::domain::{
    AgentEvent, AgentEventSender, AgentEventStream, ChatRequest, ConversationSession, Message,
};
use super::llm::{ModelClient, ToolCallAccumulator, TurnRequest};
use super::session::SessionStore;
use super::tools::{ToolExecutor, ToolRegistry};

/// One in-flight chat turn
pub struct AgentRun;

impl AgentRun {
    /// Spawn a run and return its event stream
    ///
    /// The session is checked out inside the spawned task so a turn queued
    /// behind another writer does not stall the caller.
    pub fn spawn(
        config: Arc<AgentConfig>,
        model: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        request: ChatRequest,
    ) -> AgentEventStream {
        let (sender, stream) = AgentEventStream::channel(64);

        tokio::spawn(async move {
            let scope = request.session_scope();
            let mut session = sessions.checkout(&scope).await;
            if request.reset_history {
                session.reset();
            }
            Self::drive(config, model, tools, session, request, sender).await;
        });

        stream
    }

    async fn drive(
        config: Arc<AgentConfig>,
        model: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        mut session: OwnedMutexGuard<ConversationSession>,
        request: ChatRequest,
        events: AgentEventSender,
    ) {
        // Drafting: the incoming message becomes part of the history before
        // the first model round.
        session.push(Message::user(&request.message));

        let definitions = tools.definitions();
        let executor = ToolExecutor::new(tools);
        let max_parallel = if request.parallel_tools {
            config.max_parallel_tools
        } else {
            1
        };

        let mut last_text = String::new();
        let mut total_tool_calls = 0usize;

        for round in 0..config.max_rounds {
            if events.is_closed() {
                tracing::debug!(agent = %config.name, round, "Client gone, not starting another round");
                return;
            }

            // AwaitingModel
            let mut messages = Vec::with_capacity(session.messages.len() + 1);
            messages.push(Message::system(&config.instructions));
            messages.extend(session.messages.iter().cloned());

            let mut stream = model.complete_stream(TurnRequest {
                model: config.model.clone(),
                messages,
                tools: definitions.clone(),
            });

            let mut content = String::new();
            let mut accumulator = ToolCallAccumulator::new();

            while let Some(result) = stream.next().await {
                match result {
                    Ok(chunk) => {
                        if !chunk.content.is_empty() {
                            content.push_str(&chunk.content);
                            if events.send(AgentEvent::chunk(&chunk.content)).await.is_err() {
                                return;
                            }
                        }
                        for delta in &chunk.tool_calls {
                            accumulator.apply(delta);
                        }
                    }
                    Err(e) => {
                        // Adapter failure is terminal for the run, reported
                        // exactly once.
                        tracing::error!(agent = %config.name, error = %e, "Model adapter failed");
                        let _ = events.send(AgentEvent::error(e.to_string())).await;
                        return;
                    }
                }
            }

            let calls = accumulator.build();
            if !content.is_empty() {
                last_text = content.clone();
            }

            if calls.is_empty() {
                // Finalizing
                session.push(Message::assistant(&content));
                let _ = events
                    .send(AgentEvent::complete(content, total_tool_calls))
                    .await;
                return;
            }

            // ExecutingTools
            tracing::debug!(
                agent = %config.name,
                round,
                calls = calls.len(),
                max_parallel,
                "Executing tool batch"
            );
            session.push(Message::assistant_with_tools(&content, calls.clone()));

            let records = executor
                .execute_batch(&calls, max_parallel, config.tool_call_timeout(), &events)
                .await;
            total_tool_calls += records.len();

            // Every call's outcome, success or failure, is fed back to the
            // model as that tool's output.
            for record in &records {
                session.push(Message::tool_result(&record.id, record.feedback_text()));
            }
        }

        // Round limit reached: finalize with the best available text.
        tracing::warn!(agent = %config.name, max_rounds = config.max_rounds, "Round limit reached");
        if last_text.is_empty() {
            let _ = events
                .send(AgentEvent::error(format!(
                    "round limit ({}) reached without a final response",
                    config.max_rounds
                )))
                .await;
        } else {
            session.push(Message::assistant(&last_text));
            let _ = events
                .send(AgentEvent::complete(last_text, total_tool_calls))
                .await;
        }
    }
}
