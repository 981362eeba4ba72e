pub mod handlers;
pub mod operator;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let role = match params.role.as_deref() {
        Some("operator") => Role::Operator,
        _ => Role::Display,
    };

    tracing::info!("WebSocket connection request: role={:?}", role);

    ws.on_upgrade(move |socket| async move {
        match role {
            Role::Operator => handle_operator(socket, state).await,
            Role::Display => handle_display(socket, state).await,
        }
    })
}

type Sender = SplitSink<WebSocket, Message>;

/// Serialize and send; false once the peer is gone
async fn send_json<T: Serialize>(sender: &mut Sender, msg: &T) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize outgoing message: {}", e);
            true
        }
    }
}

/// Operator console: commands in, responses out, plus a state push on every
/// replicated transition. Pushes leave out the frozen pool; `host_get_pool`
/// fetches it.
async fn handle_operator(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let role = Role::Operator;

    let welcome = ServerMessage::Welcome {
        protocol: "1.0".to_string(),
        role: role.clone(),
        state: state.draw_summary().await,
        config: state.get_config().await,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut replicated = state.replicator().subscribe();

    loop {
        tokio::select! {
            envelope = replicated.recv() => {
                match envelope {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let push = ServerMessage::DrawState { state: state.draw_summary().await };
                        if !send_json(&mut sender, &push).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &role, &state).await,
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}

/// Display: the direct transport. Starts with the mailbox value so a late
/// joiner can recover, then forwards every replicated envelope.
async fn handle_display(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe first so nothing emitted during the catch-up read is lost
    let mut replicated = state.replicator().subscribe();

    if !send_json(&mut sender, &state.replicator().latest().await).await {
        return;
    }

    loop {
        tokio::select! {
            envelope = replicated.recv() => {
                let envelope = match envelope {
                    Ok(envelope) => envelope,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Display lagged, resending latest envelope");
                        state.replicator().latest().await
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !send_json(&mut sender, &envelope).await {
                    break;
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", Role::Display);
}
