//! OpenAI-compatible chat-completions client with streaming and bounded retry

use std::time::Duration;

use backoff::ExponentialBackoff;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    FinishReason, ModelClient, ModelStream, ModelStreamSender, StreamChunk, ToolCallDelta,
    TurnRequest,
};
use crate::agent::domain::{Message, Role};
use crate::agent::error::{ModelError, ModelResult};
use crate::config::ModelSettings;

/// Client for any chat-completions endpoint speaking the OpenAI wire format
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry_max_elapsed: Duration,
}

impl OpenAiClient {
    /// Build a client from settings; the API key is read from the
    /// configured environment variable and checked per request
    pub fn new(settings: &ModelSettings) -> Self {
        let api_key = std::env::var(&settings.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                env = %settings.api_key_env,
                "Completion API key not set; model requests will fail"
            );
        }
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry_max_elapsed: Duration::from_secs(settings.retry_max_elapsed_secs),
        }
    }

    fn build_request_body(request: &TurnRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": convert_messages(&request.messages),
            "stream": true,
        });

        if !request.tools.is_empty() {
            body["tools"] = json!(request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect::<Vec<_>>());
        }

        body
    }

    /// Issue the request, retrying transient failures until a response
    /// stream is open. No chunk is emitted before this succeeds, so the
    /// retries are invisible to the orchestrator.
    async fn open_stream(
        client: reqwest::Client,
        url: String,
        api_key: String,
        body: Value,
        max_elapsed: Duration,
    ) -> ModelResult<reqwest::Response> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(max_elapsed),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, || {
            let client = client.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let body = body.clone();
            async move {
                let response = client
                    .post(&url)
                    .bearer_auth(&api_key)
                    .header("Content-Type", "application/json")
                    .json(&body)
                    .send()
                    .await;

                let error = match response {
                    Ok(r) if r.status().is_success() => return Ok(r),
                    Ok(r) => {
                        let status = r.status().as_u16();
                        let message = r.text().await.unwrap_or_default();
                        classify_status(status, message)
                    }
                    Err(e) => ModelError::from(e),
                };

                if error.is_transient() {
                    tracing::debug!(error = %error, "Transient completion API error, retrying");
                    Err(backoff::Error::transient(error))
                } else {
                    Err(backoff::Error::permanent(error))
                }
            }
        })
        .await
    }

    async fn stream_completion(
        client: reqwest::Client,
        url: String,
        api_key: String,
        body: Value,
        max_elapsed: Duration,
        sender: ModelStreamSender,
    ) -> ModelResult<()> {
        let response = Self::open_stream(client, url, api_key, body, max_elapsed).await?;

        let mut bytes = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| ModelError::Streaming(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    return Ok(());
                }

                match serde_json::from_str::<WireStreamResponse>(data) {
                    Ok(parsed) => {
                        if let Some(chunk) = parsed.into_chunk() {
                            if sender.send(chunk).await.is_err() {
                                // Consumer gone, stop reading.
                                return Ok(());
                            }
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping undecodable stream frame");
                    }
                }
            }
        }

        Ok(())
    }
}

impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete_stream(&self, request: TurnRequest) -> ModelStream {
        let (sender, stream) = ModelStream::channel(64);

        let Some(api_key) = self.api_key.clone() else {
            tokio::spawn(async move {
                let _ = sender
                    .send_error(ModelError::Authentication(
                        "completion API key is not configured".to_string(),
                    ))
                    .await;
            });
            return stream;
        };

        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_request_body(&request);
        let max_elapsed = self.retry_max_elapsed;

        tokio::spawn(async move {
            let result =
                Self::stream_completion(client, url, api_key, body, max_elapsed, sender.clone())
                    .await;
            if let Err(e) = result {
                let _ = sender.send_error(e).await;
            }
        });

        stream
    }
}

fn classify_status(status: u16, message: String) -> ModelError {
    match status {
        401 | 403 => ModelError::Authentication(message),
        429 => ModelError::RateLimited,
        400 | 422 => ModelError::InvalidRequest(message),
        _ => ModelError::Api { status, message },
    }
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let mut wire = json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                },
                "content": m.content,
            });

            if let Some(tool_calls) = &m.tool_calls {
                wire["tool_calls"] = json!(tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": serde_json::to_string(&tc.arguments)
                                    .unwrap_or_default(),
                            }
                        })
                    })
                    .collect::<Vec<_>>());
            }

            if let Some(tool_call_id) = &m.tool_call_id {
                wire["tool_call_id"] = json!(tool_call_id);
            }

            wire
        })
        .collect()
}

// Wire types for the streaming response

#[derive(Debug, Deserialize)]
struct WireStreamResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    delta: WireDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDelta {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    index: usize,
    id: Option<String>,
    function: Option<WireFunction>,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: Option<String>,
    arguments: Option<String>,
}

impl WireStreamResponse {
    fn into_chunk(self) -> Option<StreamChunk> {
        let choice = self.choices.into_iter().next()?;

        let mut chunk = StreamChunk {
            content: choice.delta.content.unwrap_or_default(),
            tool_calls: Vec::new(),
            finish_reason: None,
        };

        if let Some(tool_calls) = choice.delta.tool_calls {
            for tc in tool_calls {
                let (name, arguments) = match tc.function {
                    Some(f) => (f.name, f.arguments),
                    None => (None, None),
                };
                chunk.tool_calls.push(ToolCallDelta {
                    index: tc.index,
                    id: tc.id,
                    name,
                    arguments,
                });
            }
        }

        if let Some(reason) = choice.finish_reason {
            chunk.finish_reason = Some(match reason.as_str() {
                "length" => FinishReason::Length,
                "tool_calls" => FinishReason::ToolCalls,
                "content_filter" => FinishReason::ContentFilter,
                _ => FinishReason::Stop,
            });
        }

        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::domain::{ToolCallRequest, ToolDefinition};

    #[test]
    fn request_body_carries_tools_and_stream_flag() {
        let request = TurnRequest {
            model: "gpt-4.1-mini".to_string(),
            messages: vec![Message::system("be brief"), Message::user("hi")],
            tools: vec![ToolDefinition::new(
                "get_time",
                "time lookup",
                json!({"type": "object"}),
            )],
        };

        let body = OpenAiClient::build_request_body(&request);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["tools"][0]["function"]["name"], "get_time");
    }

    #[test]
    fn tool_messages_carry_their_call_id() {
        let messages = vec![
            Message::assistant_with_tools(
                "",
                vec![ToolCallRequest::new("call_1", "get_time", json!({}))],
            ),
            Message::tool_result("call_1", "12:30"),
        ];

        let wire = convert_messages(&messages);
        assert_eq!(wire[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(wire[1]["tool_call_id"], "call_1");
        assert_eq!(wire[1]["role"], "tool");
    }

    #[test]
    fn decodes_stream_frames() {
        let frame = r#"{"choices":[{"delta":{"content":"Hel","tool_calls":null},"finish_reason":null}]}"#;
        let parsed: WireStreamResponse = serde_json::from_str(frame).expect("decodes");
        let chunk = parsed.into_chunk().expect("has choice");
        assert_eq!(chunk.content, "Hel");
        assert!(chunk.finish_reason.is_none());

        let frame = r#"{"choices":[{"delta":{"content":null,"tool_calls":[{"index":0,"id":"call_1","function":{"name":"get_time","arguments":"{}"}}]},"finish_reason":"tool_calls"}]}"#;
        let parsed: WireStreamResponse = serde_json::from_str(frame).expect("decodes");
        let chunk = parsed.into_chunk().expect("has choice");
        assert_eq!(chunk.tool_calls.len(), 1);
        assert_eq!(chunk.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(401, "no".into()),
            ModelError::Authentication(_)
        ));
        assert!(matches!(classify_status(429, "slow".into()), ModelError::RateLimited));
        assert!(matches!(
            classify_status(400, "bad".into()),
            ModelError::InvalidRequest(_)
        ));
        assert!(classify_status(503, "down".into()).is_transient());
    }
}
