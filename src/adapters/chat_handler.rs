//! One-shot chat endpoints: SSE stream and buffered response

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};

use super::ApiError;
use crate::agent::domain::{ChatRequest, ChatResponse};
use crate::AppState;

/// `POST /chat/stream`
///
/// Serializes each agent event as one SSE frame in emission order and closes
/// after the terminal event. When the client disconnects the stream is
/// dropped, which cancels the run cooperatively: in-flight tool calls finish,
/// further rounds do not start.
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let events = state.service.start_turn(request).await?;

    let frames = events.map(|event| {
        let frame = Event::default().json_data(&event).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize agent event");
            Event::default().data("{}")
        });
        Ok::<_, Infallible>(frame)
    });

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

/// `POST /chat`
///
/// Buffers the same event sequence and answers once with the final response
/// and every tool call's terminal record.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = state.service.chat(request).await?;
    Ok(Json(response))
}
