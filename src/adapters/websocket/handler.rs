//! WebSocket upgrade handler for relay connections.
//!
//! Handles the HTTP → WebSocket upgrade and the connection lifecycle:
//! 1. Upgrade to WebSocket and register an anonymous connection
//! 2. Forward relay fan-out to the client
//! 3. Dispatch parsed client messages to the relay
//! 4. Clean up registry state on disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{ClientMessage, ServerMessage};
use super::relay::Relay;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct RelayState {
    /// The relay dispatching messages between connections.
    pub relay: Arc<Relay>,
}

impl RelayState {
    /// Create a new relay state.
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
///
/// The connection starts anonymous; identity is attached by the in-band
/// `authenticate` message, verified against the same credential layer as
/// the REST surface.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. Malformed frames are dropped
/// without a reply; transport faults produce one generic `error` notice to
/// this connection only. A misbehaving client never gets its connection
/// closed by the relay, and never affects other connections.
async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (mut sender, mut receiver) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = relay.connect(outbound_tx).await;

    // Forward relay fan-out to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json)).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Dispatch inbound messages to the relay
    let relay_for_recv = relay.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        relay_for_recv.handle_message(connection_id, message).await;
                    }
                    Err(e) => {
                        // Malformed input is a silent no-op by contract
                        tracing::debug!(
                            connection_id = %connection_id,
                            "Ignoring malformed message: {}",
                            e
                        );
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // WebSocket protocol frames - handled by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Client sent close frame"
                    );
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "Receive error: {}",
                        e
                    );
                    // Generic transport-fault notice to this connection only;
                    // delivery is best effort since the transport is failing.
                    relay_for_recv
                        .registry()
                        .send_to(
                            connection_id,
                            ServerMessage::Error {
                                message: "connection error".to_string(),
                            },
                        )
                        .await;
                    break;
                }
            }
        }
    });

    // Whichever task finishes first tears down the other
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    relay.handle_disconnect(connection_id).await;
}
