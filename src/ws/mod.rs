//! WebSocket feed of document snapshots
//!
//! Each connected client receives the current document immediately, then a
//! fresh snapshot after every mutation or background refresh.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Document;
use crate::state::AppState;

/// Client message types
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    Ping,
}

/// Server message types
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ServerMessage {
    Snapshot { document: Document },
    Pong,
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4().to_string();
    tracing::info!("WebSocket client {} connected", client_id);

    let (mut sender, mut receiver) = socket.split();

    let (snapshot, mut rx) = state.sync.subscribe().await;
    if send_message(&mut sender, &ServerMessage::Snapshot { document: snapshot })
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Ok(document) => {
                        if send_message(&mut sender, &ServerMessage::Snapshot { document })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    // Lagged receivers resync on the next update
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "WebSocket client {} lagged, skipped {} updates",
                            client_id,
                            skipped
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                            tracing::debug!("Ping from client {}", client_id);
                            if send_message(&mut sender, &ServerMessage::Pong).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!("WebSocket client {} disconnected", client_id);
}

async fn send_message(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &ServerMessage,
) -> Result<(), ()> {
    let text = serde_json::to_string(message).map_err(|_| ())?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}
