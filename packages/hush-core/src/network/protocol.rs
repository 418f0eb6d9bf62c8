//! Participant view of the relay envelope format.
//!
//! Must match the relay server's `ClientMessage` / `ServerMessage` enums:
//! JSON objects tagged by `kind`, kebab-case kinds, camelCase fields.

use serde::{Deserialize, Serialize};

use crate::codec::SealedMessage;

/// Envelopes a participant sends to the relay.
///
/// There is no sender field: the relay stamps every forwarded envelope with
/// the identity it assigned to this connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Announce our public key (PEM) to every other participant.
    KeyAnnounce { public_key: String },

    /// A sealed chat message, forwarded to every other participant.
    CipherMessage { message: SealedMessage },
}

/// Envelopes the relay sends to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First envelope on every connection.
    Welcome {
        client_id: String,
        active_clients: Vec<String>,
    },

    /// Another participant connected.
    Joined { client_id: String },

    /// A participant disconnected.
    Left { client_id: String },

    /// A participant's public key.
    KeyAnnounce {
        client_id: String,
        public_key: String,
    },

    /// A sealed message. `message` is whatever the sender put there; the
    /// relay does not look inside, so it is kept as raw JSON until opened.
    CipherMessage {
        from: String,
        message: serde_json::Value,
    },

    /// The relay rejected one of our envelopes.
    Error { message: String },
}
