//! Duplex WebSocket adapter
//!
//! One connection can host many chat turns. Every event frame is tagged
//! with the turn id it belongs to, so a client that pipelines requests can
//! demultiplex overlapping turns; nothing here assumes one turn per
//! connection. Turns against the same session serialize on the session
//! checkout inside the agent core, not in this adapter.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::domain::{AgentEvent, ChatRequest};
use crate::AppState;

/// Frame sent by the client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    /// Start a chat turn on this connection
    Chat(ChatRequest),
    Ping,
    Disconnect,
}

/// Frame sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    /// One agent event, tagged with the turn it belongs to
    Event {
        turn_id: String,
        #[serde(flatten)]
        event: AgentEvent,
    },
    Pong,
    /// Connection-level problem (unparseable frame, unknown agent)
    Error { message: String },
}

/// `GET /ws`
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // All frames funnel through one channel so overlapping turns cannot
    // interleave partial writes.
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(100);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(json) => {
                    if ws_sender.send(WsMessage::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server frame");
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Chat(request)) => {
                    start_turn(&state, request, tx.clone()).await;
                }
                Ok(ClientFrame::Ping) => {
                    let _ = tx.send(ServerFrame::Pong).await;
                }
                Ok(ClientFrame::Disconnect) => {
                    tracing::debug!("Client requested disconnect");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable client frame");
                    let _ = tx
                        .send(ServerFrame::Error {
                            message: format!("invalid frame: {}", e),
                        })
                        .await;
                }
            },
            Ok(WsMessage::Close(_)) => {
                tracing::debug!("Client sent close frame");
                break;
            }
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Ok(WsMessage::Binary(_)) => {
                tracing::warn!("Unexpected binary frame");
            }
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Dropping the channel ends the send task; any still-running turn sees a
    // closed event stream and stops starting new rounds.
    drop(tx);
    let _ = send_task.await;
}

async fn start_turn(state: &AppState, request: ChatRequest, tx: mpsc::Sender<ServerFrame>) {
    let turn_id = Uuid::new_v4().to_string();

    match state.service.start_turn(request).await {
        Ok(mut events) => {
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    let frame = ServerFrame::Event {
                        turn_id: turn_id.clone(),
                        event,
                    };
                    if tx.send(frame).await.is_err() {
                        break;
                    }
                }
            });
        }
        Err(e) => {
            let _ = tx
                .send(ServerFrame::Event {
                    turn_id,
                    event: AgentEvent::error(e.to_string()),
                })
                .await;
        }
    }
}
