use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use meetscribe_transcript::wire::ClientMessage;

use crate::state::AppState;

use super::storage::WsSender;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify_token(&params.token) {
        Ok(c) => c,
        Err(_) => {
            return Response::builder()
                .status(401)
                .body("Unauthorized".into())
                .unwrap();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, claims.sub))
}

async fn handle_socket(socket: WebSocket, state: AppState, viewer: String) {
    let connection_id = Uuid::new_v4().to_string();
    info!(%viewer, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(Mutex::new(sender));

    // Message loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &connection_id, &sender, &text).await;
            }
            Ok(Message::Ping(data)) => {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(%viewer, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup: drop every watch this connection held
    state.hub.remove_connection(&connection_id);

    info!(%viewer, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    connection_id: &str,
    sender: &WsSender,
    text: &str,
) {
    // Malformed control messages are dropped; they never tear the
    // connection down.
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(%connection_id, %e, "Dropping malformed WS message");
            return;
        }
    };

    match message {
        ClientMessage::WatchTranscript { meeting_name } => {
            state
                .hub
                .watch(&meeting_name, connection_id, sender.clone())
                .await;
        }
        ClientMessage::UnwatchTranscript { meeting_name } => {
            state.hub.unwatch(&meeting_name, connection_id);
        }
        ClientMessage::RequestTranscript { room_name } => {
            info!(%connection_id, %room_name, "Transcript requested");
            let reply = state.hub.request_final(&room_name).await;
            let text = serde_json::to_string(&reply).unwrap_or_default();
            let mut guard = sender.lock().await;
            if let Err(e) = guard.send(Message::text(text)).await {
                warn!(%connection_id, %e, "Failed to send requested transcript");
            }
        }
    }
}
