//! WebSocket connection handler.
//!
//! Manages individual WebSocket connections: registering the session,
//! parsing participant envelopes, fanning them out through the registry and
//! cleaning up when the socket closes.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::protocol::{parse_client_message, ClientMessage, ProtocolViolation, ServerMessage};
use crate::state::SessionRegistry;

/// Handle a single WebSocket connection.
///
/// This function runs for the lifetime of the connection:
/// 1. Registers the session (queues `welcome`, notifies the others)
/// 2. Spawns a sender task to forward outbound envelopes
/// 3. Processes incoming frames until the connection closes
/// 4. Unregisters the session (notifies the others)
pub async fn handle_websocket(socket: WebSocket, registry: SessionRegistry) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Create the outbound channel for this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // ── Step 1: Register Session ──────────────────────────────────────────

    let client_id = registry.register(tx).client_id;
    tracing::info!(client_id = client_id.as_str(), "WebSocket connected");

    // ── Step 2: Spawn Sender Task ─────────────────────────────────────────

    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize server message: {}", e);
                }
            }
        }
    });

    // ── Step 3: Process Messages ──────────────────────────────────────────

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                handle_text(&registry, &client_id, &text);
            }
            Ok(Message::Binary(_)) => {
                reject(&registry, &client_id, ProtocolViolation::BinaryFrame);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(client_id = client_id.as_str(), "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::warn!(
                    client_id = client_id.as_str(),
                    error = %e,
                    "WebSocket error"
                );
                break;
            }
            _ => {} // Ping, Pong are answered by axum
        }
    }

    // ── Step 4: Cleanup ───────────────────────────────────────────────────

    registry.unregister(&client_id);
    sender_task.abort();
    tracing::info!(client_id = client_id.as_str(), "WebSocket disconnected");
}

/// Handle one text frame from `client_id`.
///
/// Valid envelopes are relabelled with `client_id` and sent to every other
/// session; anything else earns the sender an `error` envelope.
pub fn handle_text(registry: &SessionRegistry, client_id: &str, text: &str) {
    match parse_client_message(text) {
        Ok(msg) => handle_client_message(registry, client_id, msg),
        Err(violation) => reject(registry, client_id, violation),
    }
}

/// Handle a parsed client message.
fn handle_client_message(registry: &SessionRegistry, client_id: &str, msg: ClientMessage) {
    let (kind, outbound) = match msg {
        ClientMessage::KeyAnnounce { public_key } => (
            "key-announce",
            ServerMessage::KeyAnnounce {
                client_id: client_id.to_string(),
                public_key,
            },
        ),
        ClientMessage::CipherMessage { message } => (
            "cipher-message",
            ServerMessage::CipherMessage {
                from: client_id.to_string(),
                message,
            },
        ),
    };

    let delivered = registry.broadcast(&outbound, Some(client_id));
    tracing::debug!(client_id = client_id, kind, delivered, "Relayed envelope");
}

fn reject(registry: &SessionRegistry, client_id: &str, violation: ProtocolViolation) {
    tracing::warn!(client_id = client_id, reason = %violation, "Rejected client frame");
    registry.send_to(client_id, violation.into());
}

// ── Tests ─────────────────────────────────────────────────────────────────────
