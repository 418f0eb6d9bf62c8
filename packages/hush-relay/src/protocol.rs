//! Relay protocol message definitions.
//!
//! The relay speaks a simple JSON-over-WebSocket protocol. Every envelope is
//! an object tagged by `kind`. Payloads are opaque to the relay: sealed
//! messages are forwarded as raw JSON and announced keys are never parsed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ── Client → Relay ────────────────────────────────────────────────────────────

/// Envelopes a participant may send.
///
/// Any `clientId`, `from` or `sender` field a participant adds is ignored;
/// the relay labels forwarded envelopes with the id it assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Announce a public key (PEM text, not validated here).
    KeyAnnounce { public_key: String },

    /// A sealed message for the other participants.
    CipherMessage { message: Value },
}

// ── Relay → Client ────────────────────────────────────────────────────────────

/// Envelopes the relay sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First envelope on every session: the assigned id and who else is here.
    Welcome {
        client_id: String,
        active_clients: Vec<String>,
    },

    /// Another session was accepted.
    Joined { client_id: String },

    /// A session closed.
    Left { client_id: String },

    /// A participant's public key, labelled with its session id.
    KeyAnnounce {
        client_id: String,
        public_key: String,
    },

    /// A sealed message, labelled with the sending session id.
    CipherMessage { from: String, message: Value },

    /// Sent only to the session that caused it.
    Error { message: String },
}

impl From<ProtocolViolation> for ServerMessage {
    fn from(violation: ProtocolViolation) -> Self {
        ServerMessage::Error {
            message: violation.to_string(),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Why an inbound frame was rejected. The display text is what the
/// participant receives in the `error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing kind")]
    MissingKind,

    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Binary frames are not supported")]
    BinaryFrame,
}

const CLIENT_KINDS: &[&str] = &["key-announce", "cipher-message"];

/// Parse one text frame from a participant.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolViolation> {
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolViolation::InvalidJson)?;

    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(ProtocolViolation::MissingKind)?;

    if !CLIENT_KINDS.contains(&kind) {
        return Err(ProtocolViolation::UnknownKind(kind.to_string()));
    }

    serde_json::from_value(value).map_err(|e| ProtocolViolation::InvalidPayload(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
