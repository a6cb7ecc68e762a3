//! Bounded-concurrency tool batch executor

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::registry::ToolRegistry;
use crate::agent::domain::{AgentEvent, AgentEventSender, ToolCallInfo, ToolCallRequest};

/// Executes one batch of tool calls for an agent run
///
/// At most `max_parallel` calls run concurrently; each call is bound by the
/// per-call timeout independently of the others. Every call reaches exactly
/// one terminal state and the batch only finishes once all of them have.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run a batch to completion, emitting lifecycle events as they happen
    ///
    /// `ToolCallStart` is emitted only once a concurrency permit is held, so
    /// at most `max_parallel` calls are ever executing. Results come back in
    /// request order regardless of completion order; consumers of the event
    /// stream correlate by call id instead.
    pub async fn execute_batch(
        &self,
        calls: &[ToolCallRequest],
        max_parallel: usize,
        timeout: Duration,
        events: &AgentEventSender,
    ) -> Vec<ToolCallInfo> {
        let mut results: Vec<Option<ToolCallInfo>> = vec![None; calls.len()];
        let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        let mut running: JoinSet<(usize, ToolCallInfo)> = JoinSet::new();

        for (index, call) in calls.iter().enumerate() {
            let Some(handler) = self.registry.handler(&call.name) else {
                // Unknown tool: immediate terminal failure, no start event.
                let info = ToolCallInfo::rejected(call, "tool not found");
                let _ = events.send(AgentEvent::tool_error(&info)).await;
                results[index] = Some(info);
                continue;
            };

            let semaphore = semaphore.clone();
            let events = events.clone();
            let call = call.clone();
            running.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let info = ToolCallInfo::rejected(&call, "executor shut down");
                        let _ = events.send(AgentEvent::tool_error(&info)).await;
                        return (index, info);
                    }
                };

                let mut info = ToolCallInfo::executing(&call);
                let _ = events.send(AgentEvent::tool_start(&info)).await;

                let started = Instant::now();
                let outcome = tokio::time::timeout(timeout, handler.call(call.arguments.clone())).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                drop(permit);

                match outcome {
                    Ok(Ok(output)) => {
                        info.complete(render_output(&output), elapsed_ms);
                        let _ = events.send(AgentEvent::tool_complete(&info)).await;
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(tool = %call.name, id = %call.id, error = %err, "Tool call failed");
                        info.fail(err.to_string(), elapsed_ms);
                        let _ = events.send(AgentEvent::tool_error(&info)).await;
                    }
                    Err(_) => {
                        tracing::warn!(tool = %call.name, id = %call.id, "Tool call timed out");
                        info.fail(
                            format!("timed out after {}s", timeout.as_secs_f32()),
                            elapsed_ms,
                        );
                        let _ = events.send(AgentEvent::tool_error(&info)).await;
                    }
                }

                (index, info)
            });
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((index, info)) => results[index] = Some(info),
                Err(err) => tracing::error!(error = %err, "Tool task aborted unexpectedly"),
            }
        }

        // A panicked task leaves its slot empty; record the failure so the
        // call still reaches a terminal state.
        for (index, slot) in results.iter_mut().enumerate() {
            if slot.is_none() {
                let info = ToolCallInfo::rejected(&calls[index], "tool task panicked");
                let _ = events.send(AgentEvent::tool_error(&info)).await;
                *slot = Some(info);
            }
        }

        results.into_iter().flatten().collect()
    }
}

fn render_output(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
