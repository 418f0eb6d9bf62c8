//! Server state management.
//!
//! The [`SessionRegistry`] maps relay-assigned session ids to the outbound
//! channel of each connected participant. Every mutation takes one write
//! lock, so connects, disconnects and the notices they cause are seen by all
//! sessions in a single global order.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerMessage;

/// Default port, as used by the browser client.
const DEFAULT_PORT: u16 = 3000;

/// Default cap on a single inbound WebSocket message.
const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Larger inbound messages are refused by the transport
    pub max_message_bytes: usize,
}

impl RelayConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

/// A connected participant's outbound channel.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// What a new session learns when it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub client_id: String,
    /// Sessions that were live at that instant, excluding this one
    pub roster: Vec<String>,
}

/// Live sessions, keyed by relay-assigned id.
///
/// Cheap to clone; every clone refers to the same sessions. Independent
/// registries never see each other's sessions.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, ClientSender>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Session Lifecycle ─────────────────────────────────────────────────

    /// Accept a new session.
    ///
    /// Under one write lock: assigns an id unused by any live session,
    /// queues the `welcome` on `sender`, stores the session and queues a
    /// `joined` notice to every other session. Nothing can reach the new
    /// session ahead of its `welcome`.
    pub fn register(&self, sender: ClientSender) -> Registration {
        let mut sessions = self.sessions.write();

        let client_id = loop {
            let id = Uuid::new_v4().to_string();
            if !sessions.contains_key(&id) {
                break id;
            }
        };

        let mut roster: Vec<String> = sessions.keys().cloned().collect();
        roster.sort();

        let _ = sender.send(ServerMessage::Welcome {
            client_id: client_id.clone(),
            active_clients: roster.clone(),
        });

        let joined = ServerMessage::Joined {
            client_id: client_id.clone(),
        };
        deliver(&sessions, &joined, None);

        sessions.insert(client_id.clone(), sender);
        tracing::info!(client_id = client_id.as_str(), online = sessions.len(), "Client registered");

        Registration { client_id, roster }
    }

    /// Remove a session and tell everyone left.
    ///
    /// Unknown ids are a no-op and send nothing. Returns whether a session
    /// was removed.
    pub fn unregister(&self, client_id: &str) -> bool {
        let mut sessions = self.sessions.write();

        if sessions.remove(client_id).is_none() {
            return false;
        }

        let left = ServerMessage::Left {
            client_id: client_id.to_string(),
        };
        deliver(&sessions, &left, None);

        tracing::info!(client_id = client_id, online = sessions.len(), "Client unregistered");
        true
    }

    // ── Delivery ──────────────────────────────────────────────────────────

    /// Deliver to every live session except `exclude`.
    ///
    /// Closed channels are skipped. Returns how many sessions accepted the
    /// envelope.
    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<&str>) -> usize {
        let sessions = self.sessions.read();
        deliver(&sessions, message, exclude)
    }

    /// Deliver to one session. Returns `false` if it is gone.
    pub fn send_to(&self, client_id: &str, message: ServerMessage) -> bool {
        let sessions = self.sessions.read();
        match sessions.get(client_id) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_online(&self, client_id: &str) -> bool {
        self.sessions.read().contains_key(client_id)
    }

    pub fn online_count(&self) -> usize {
        self.sessions.read().len()
    }
}

fn deliver(
    sessions: &HashMap<String, ClientSender>,
    message: &ServerMessage,
    exclude: Option<&str>,
) -> usize {
    let mut delivered = 0;
    for (client_id, sender) in sessions {
        if Some(client_id.as_str()) == exclude {
            continue;
        }
        if sender.send(message.clone()).is_ok() {
            delivered += 1;
        } else {
            tracing::debug!(client_id = client_id.as_str(), "Skipping closed session");
        }
    }
    delivered
}

// ── Tests ─────────────────────────────────────────────────────────────────────
