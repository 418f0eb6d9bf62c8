//! # Client Events
//!
//! Events the participant core surfaces to whatever UI drives it.

/// Events emitted by the client state machine and the connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The relay accepted us and assigned an id
    Welcomed {
        /// Our id for this connection
        client_id: String,
        /// Participants that were already connected
        roster: Vec<String>,
    },

    /// A new participant connected
    PeerJoined {
        peer_id: String,
    },

    /// A participant disconnected; its contact has been removed
    PeerLeft {
        peer_id: String,
    },

    /// Key exchange with a participant completed
    PeerKeyReady {
        peer_id: String,
    },

    /// A participant announced a key we could not use
    KeyRejected {
        peer_id: String,
        reason: String,
    },

    /// A message was opened successfully
    MessageReceived {
        from: String,
        text: String,
    },

    /// A message arrived that could not be opened
    Undecryptable {
        from: String,
        reason: String,
    },

    /// The relay rejected one of our envelopes
    RelayError {
        message: String,
    },

    /// The connection ended
    Disconnected,
}
