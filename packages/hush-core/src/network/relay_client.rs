//! # Relay Client
//!
//! WebSocket connection from one participant to a hush relay.
//!
//! ## Architecture
//!
//! Each connection is a single tokio task that owns the socket and the
//! [`ChatClient`] state machine:
//!
//! ```text
//!            commands (send text, list contacts, close)
//!  RelayHandle ───────────────────────────────┐
//!                                             ▼
//!                         ┌───────────────────────────────────┐
//!   relay ◄── frames ───► │  connection task                  │ ──► ClientEvent
//!                         │  select! { inbound, commands }    │     receiver
//!                         │  ChatClient::handle / compose     │
//!                         └───────────────────────────────────┘
//! ```
//!
//! Inbound envelopes are processed one at a time in arrival order, so
//! messages from any single peer are seen in the order the relay forwarded
//! them. Crypto runs inline; the only suspension points are socket reads and
//! writes. Dropping every [`RelayHandle`] or calling [`RelayHandle::close`]
//! is the only way to cancel the connection.

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::contacts::ContactSummary;
use crate::error::{Error, Result};
use crate::identity::Identity;

use super::client::{ChatClient, ClientAction};
use super::events::ClientEvent;
use super::protocol::{ClientMessage, ServerMessage};

/// Requests from the UI to the connection task
#[derive(Debug)]
enum Command {
    SendText {
        peer_id: String,
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Contacts {
        reply: oneshot::Sender<Vec<ContactSummary>>,
    },
    Close,
}

/// Cloneable handle to a running connection task
#[derive(Debug, Clone)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl RelayHandle {
    /// Seal `text` for `peer_id` and send it through the relay.
    ///
    /// ## Errors
    ///
    /// `ContactNotReady` / `UnknownContact` if there is no shared key for
    /// the peer (nothing is sent), `NotConnected` if the task has stopped.
    pub async fn send_text(&self, peer_id: &str, text: &str) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SendText {
                peer_id: peer_id.to_string(),
                text: text.to_string(),
                reply,
            })
            .map_err(|_| Error::NotConnected)?;
        response.await.map_err(|_| Error::NotConnected)?
    }

    /// Snapshot of the contact book
    pub async fn contacts(&self) -> Result<Vec<ContactSummary>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Contacts { reply })
            .map_err(|_| Error::NotConnected)?;
        response.await.map_err(|_| Error::NotConnected)
    }

    /// Ask the task to close the socket. Idempotent.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Whether the connection task is still running
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Connect to a relay WebSocket URL (e.g. `ws://127.0.0.1:3000/ws`).
///
/// Returns a handle for commands and the stream of events. The first event
/// on a healthy connection is [`ClientEvent::Welcomed`]; the last is always
/// [`ClientEvent::Disconnected`].
pub async fn connect(
    url: &str,
    identity: Identity,
) -> Result<(RelayHandle, mpsc::UnboundedReceiver<ClientEvent>)> {
    let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
    tracing::info!(url, "Connected to relay");
    Ok(spawn(socket, ChatClient::new(identity)))
}

/// Run a connection task over an already-established WebSocket.
pub fn spawn<S>(socket: S, client: ChatClient) -> (RelayHandle, mpsc::UnboundedReceiver<ClientEvent>)
where
    S: Stream<Item = std::result::Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin
        + Send
        + 'static,
{
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(socket, client, commands_rx, events_tx));

    (
        RelayHandle {
            commands: commands_tx,
        },
        events_rx,
    )
}

async fn run<S>(
    socket: S,
    mut client: ChatClient,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
) where
    S: Stream<Item = std::result::Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = stream.next() => {
                let open = match frame {
                    Some(Ok(Message::Text(text))) => {
                        on_text(&mut client, &text, &mut sink, &events).await
                    }
                    Some(Ok(Message::Close(_))) | None => false,
                    Some(Ok(_)) => true, // Binary, Ping, Pong
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Relay connection error");
                        false
                    }
                };
                if !open {
                    break;
                }
            }

            command = commands.recv() => match command {
                Some(Command::SendText { peer_id, text, reply }) => {
                    let result = match client.compose(&peer_id, &text) {
                        Ok(envelope) => send_envelope(&mut sink, &envelope).await,
                        Err(e) => Err(e),
                    };
                    let failed_write = matches!(result, Err(Error::ConnectionFailed(_)));
                    let _ = reply.send(result);
                    if failed_write {
                        break;
                    }
                }
                Some(Command::Contacts { reply }) => {
                    let _ = reply.send(client.contacts().summaries());
                }
                Some(Command::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    tracing::info!(client_id = client.client_id().unwrap_or("-"), "Disconnected from relay");
    let _ = events.send(ClientEvent::Disconnected);
}

/// Handle one text frame. Returns `false` once the socket is unusable.
async fn on_text<W>(
    client: &mut ChatClient,
    text: &str,
    sink: &mut W,
    events: &mpsc::UnboundedSender<ClientEvent>,
) -> bool
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparseable relay frame");
            return true;
        }
    };

    for action in client.handle(message) {
        match action {
            ClientAction::Send(envelope) => {
                if let Err(e) = send_envelope(sink, &envelope).await {
                    tracing::warn!(error = %e, "Failed to write to relay");
                    return false;
                }
            }
            ClientAction::Emit(event) => {
                let _ = events.send(event);
            }
        }
    }
    true
}

async fn send_envelope<W>(sink: &mut W, envelope: &ClientMessage) -> Result<()>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let json = serde_json::to_string(envelope)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::DuplexStream;
    use tokio_tungstenite::tungstenite::protocol::Role;
    use tokio_tungstenite::WebSocketStream;

    use crate::crypto::KeyPair;

    type Relay = WebSocketStream<DuplexStream>;

    async fn pair() -> (Relay, RelayHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (client_io, relay_io) = tokio::io::duplex(64 * 1024);
        let client_ws = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let relay_ws = WebSocketStream::from_raw_socket(relay_io, Role::Server, None).await;
        let (handle, events) = spawn(client_ws, ChatClient::new(Identity::generate()));
        (relay_ws, handle, events)
    }

    async fn push(relay: &mut Relay, message: &ServerMessage) {
        let json = serde_json::to_string(message).unwrap();
        relay.send(Message::Text(json)).await.unwrap();
    }

    async fn pull(relay: &mut Relay) -> ClientMessage {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), relay.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    async fn event(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap()
    }

    fn welcome(roster: &[&str]) -> ServerMessage {
        ServerMessage::Welcome {
            client_id: "me".to_string(),
            active_clients: roster.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_welcome_triggers_announcement() {
        let (mut relay, _handle, mut events) = pair().await;

        push(&mut relay, &welcome(&["peer"])).await;

        assert_eq!(
            event(&mut events).await,
            ClientEvent::Welcomed {
                client_id: "me".to_string(),
                roster: vec!["peer".to_string()],
            }
        );
        assert!(matches!(pull(&mut relay).await, ClientMessage::KeyAnnounce { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_frames_are_skipped() {
        let (mut relay, _handle, mut events) = pair().await;

        relay.send(Message::Text("not json".into())).await.unwrap();
        relay
            .send(Message::Text(r#"{"kind":"mystery"}"#.into()))
            .await
            .unwrap();
        push(&mut relay, &welcome(&[])).await;

        assert!(matches!(event(&mut events).await, ClientEvent::Welcomed { .. }));
    }

    #[tokio::test]
    async fn test_send_text_before_key_sends_nothing() {
        let (mut relay, handle, mut events) = pair().await;
        push(&mut relay, &welcome(&["peer"])).await;
        event(&mut events).await;
        pull(&mut relay).await; // own announcement

        let err = handle.send_text("peer", "hi").await.unwrap_err();
        assert!(matches!(err, Error::ContactNotReady(_)));

        let quiet = tokio::time::timeout(Duration::from_millis(100), relay.next()).await;
        assert!(quiet.is_err());
    }

    #[tokio::test]
    async fn test_send_text_after_key_exchange() {
        let (mut relay, handle, mut events) = pair().await;
        let peer = KeyPair::generate();

        push(&mut relay, &welcome(&["peer"])).await;
        event(&mut events).await;
        pull(&mut relay).await;

        push(
            &mut relay,
            &ServerMessage::KeyAnnounce {
                client_id: "peer".to_string(),
                public_key: peer.export_public_key(),
            },
        )
        .await;
        assert_eq!(
            event(&mut events).await,
            ClientEvent::PeerKeyReady {
                peer_id: "peer".to_string()
            }
        );

        handle.send_text("peer", "hello").await.unwrap();
        assert!(matches!(pull(&mut relay).await, ClientMessage::CipherMessage { .. }));

        let contacts = handle.contacts().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].key_ready);
    }

    #[tokio::test]
    async fn test_relay_close_ends_with_disconnected() {
        let (mut relay, handle, mut events) = pair().await;

        relay.close(None).await.unwrap();

        assert_eq!(event(&mut events).await, ClientEvent::Disconnected);
        assert!(events.recv().await.is_none());
        assert!(matches!(handle.send_text("x", "y").await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (_relay, handle, mut events) = pair().await;

        handle.close();
        handle.close();

        assert_eq!(event(&mut events).await, ClientEvent::Disconnected);
        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.is_connected() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
