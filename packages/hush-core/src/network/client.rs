//! # Chat Client State Machine
//!
//! Turns relay envelopes into contact updates, outgoing envelopes and UI
//! events.
//!
//! # Architecture: Action-Based State Machine
//!
//! - [`ChatClient::handle`] takes one [`ServerMessage`] and returns the
//!   [`ClientAction`]s it caused, in order
//! - No I/O happens here; the connection task executes the actions
//! - Peer-caused faults become events, never errors
//!
//! ```text
//!  welcome ──► contacts for roster (pending) ─► announce own key
//!  joined  ──► contact (pending), if new    ─► announce own key
//!  key     ──► import + derive              ─► PeerKeyReady / KeyRejected
//!  cipher  ──► open with peer's shared key  ─► MessageReceived / Undecryptable
//!  left    ──► drop contact                 ─► PeerLeft
//!  error   ──►                                 RelayError
//! ```

use crate::codec::{self, SealedMessage};
use crate::contacts::{ContactBook, KeyInstall};
use crate::error::{Error, Result};
use crate::identity::Identity;

use super::events::ClientEvent;
use super::protocol::{ClientMessage, ServerMessage};

/// Something the connection task must do on behalf of the client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Write this envelope to the relay
    Send(ClientMessage),
    /// Surface this event to the UI
    Emit(ClientEvent),
}

/// Participant-side protocol state for one relay connection
#[derive(Debug)]
pub struct ChatClient {
    identity: Identity,
    client_id: Option<String>,
    contacts: ContactBook,
}

impl ChatClient {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            client_id: None,
            contacts: ContactBook::new(),
        }
    }

    /// Our relay-assigned id, once welcomed
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn contacts(&self) -> &ContactBook {
        &self.contacts
    }

    /// The envelope that announces our public key
    pub fn announcement(&self) -> ClientMessage {
        ClientMessage::KeyAnnounce {
            public_key: self.identity.public_key_pem().to_string(),
        }
    }

    /// Seal `text` for `peer_id`.
    ///
    /// ## Errors
    ///
    /// `UnknownContact` / `ContactNotReady` when no shared key exists for
    /// the peer. Nothing is sent in that case.
    pub fn compose(&self, peer_id: &str, text: &str) -> Result<ClientMessage> {
        let key = self.contacts.shared_key(peer_id)?;
        let message = codec::seal(key, text)?;
        Ok(ClientMessage::CipherMessage { message })
    }

    /// Process one envelope from the relay.
    pub fn handle(&mut self, message: ServerMessage) -> Vec<ClientAction> {
        match message {
            ServerMessage::Welcome {
                client_id,
                active_clients,
            } => self.on_welcome(client_id, active_clients),
            ServerMessage::Joined { client_id } => self.on_joined(client_id),
            ServerMessage::Left { client_id } => self.on_left(client_id),
            ServerMessage::KeyAnnounce {
                client_id,
                public_key,
            } => self.on_key_announce(client_id, &public_key),
            ServerMessage::CipherMessage { from, message } => self.on_cipher_message(from, message),
            ServerMessage::Error { message } => {
                tracing::warn!(reason = message.as_str(), "Relay rejected an envelope");
                vec![ClientAction::Emit(ClientEvent::RelayError { message })]
            }
        }
    }

    fn is_self(&self, peer_id: &str) -> bool {
        self.client_id.as_deref() == Some(peer_id)
    }

    fn on_welcome(&mut self, client_id: String, roster: Vec<String>) -> Vec<ClientAction> {
        if let Some(previous) = self.client_id.as_deref() {
            tracing::warn!(previous, new = client_id.as_str(), "Welcomed twice");
        }
        tracing::info!(client_id = client_id.as_str(), peers = roster.len(), "Welcomed by relay");

        let roster: Vec<String> = roster.into_iter().filter(|id| *id != client_id).collect();
        for peer_id in &roster {
            self.contacts.ensure(peer_id);
        }
        self.client_id = Some(client_id.clone());

        vec![
            ClientAction::Emit(ClientEvent::Welcomed { client_id, roster }),
            ClientAction::Send(self.announcement()),
        ]
    }

    fn on_joined(&mut self, peer_id: String) -> Vec<ClientAction> {
        if self.is_self(&peer_id) || !self.contacts.ensure(&peer_id) {
            return Vec::new();
        }
        tracing::debug!(peer = peer_id.as_str(), "Peer joined");

        vec![
            ClientAction::Emit(ClientEvent::PeerJoined { peer_id }),
            ClientAction::Send(self.announcement()),
        ]
    }

    fn on_left(&mut self, peer_id: String) -> Vec<ClientAction> {
        if self.contacts.remove(&peer_id).is_none() {
            return Vec::new();
        }
        tracing::debug!(peer = peer_id.as_str(), "Peer left");

        vec![ClientAction::Emit(ClientEvent::PeerLeft { peer_id })]
    }

    fn on_key_announce(&mut self, peer_id: String, public_key_pem: &str) -> Vec<ClientAction> {
        if self.is_self(&peer_id) {
            return Vec::new();
        }

        match self
            .contacts
            .install_key(self.identity.key_pair(), &peer_id, public_key_pem)
        {
            Ok(KeyInstall::Derived) => {
                tracing::debug!(peer = peer_id.as_str(), "Shared key derived");
                vec![ClientAction::Emit(ClientEvent::PeerKeyReady { peer_id })]
            }
            Ok(KeyInstall::AlreadyReady) => Vec::new(),
            Err(e) => {
                tracing::warn!(peer = peer_id.as_str(), error = %e, "Rejected announced key");
                vec![ClientAction::Emit(ClientEvent::KeyRejected {
                    peer_id,
                    reason: e.to_string(),
                })]
            }
        }
    }

    fn on_cipher_message(&mut self, from: String, payload: serde_json::Value) -> Vec<ClientAction> {
        let event = match self.open(&from, payload) {
            Ok(text) => ClientEvent::MessageReceived { from, text },
            Err(e) => {
                if e.is_peer_fault() {
                    tracing::warn!(from = from.as_str(), error = %e, "Could not decrypt message");
                } else {
                    tracing::debug!(from = from.as_str(), error = %e, "No shared key for sender");
                }
                ClientEvent::Undecryptable {
                    from,
                    reason: e.to_string(),
                }
            }
        };
        vec![ClientAction::Emit(event)]
    }

    fn open(&self, from: &str, payload: serde_json::Value) -> Result<String> {
        let key = self.contacts.shared_key(from)?;
        let sealed: SealedMessage = serde_json::from_value(payload)
            .map_err(|e| Error::DecryptionFailed(format!("malformed sealed message: {}", e)))?;
        codec::open(key, &sealed)
    }
}
