//! # Error Handling
//!
//! Error types for the participant side of hush.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── InvalidKey            - Malformed PEM / SPKI / key bytes      │
//! │  │   ├── KeyAgreementFailed    - Non-contributory DH or HKDF failure   │
//! │  │   ├── EncryptionFailed      - AEAD seal failed                      │
//! │  │   └── DecryptionFailed      - Wrong key, tampered or malformed data │
//! │  │                                                                      │
//! │  ├── Contact Errors                                                    │
//! │  │   ├── UnknownContact        - Peer is not in the contact book       │
//! │  │   └── ContactNotReady       - Peer has not announced a key yet      │
//! │  │                                                                      │
//! │  ├── Network Errors                                                    │
//! │  │   ├── ConnectionFailed      - Could not reach the relay             │
//! │  │   └── NotConnected          - Connection task has stopped           │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      └── SerializationError    - Envelope could not be encoded         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Peer-caused faults (a bad key, an undecryptable message) are never fatal:
//! the client turns them into visible events and leaves its state unchanged.

use thiserror::Error;

/// Result type alias for hush-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hush-core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key agreement produced no usable key
    #[error("Key agreement failed: {0}")]
    KeyAgreementFailed(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ========================================================================
    // Contact Errors (600-699)
    // ========================================================================

    /// No contact exists for this peer
    #[error("Unknown contact: {0}")]
    UnknownContact(String),

    /// The contact exists but its key exchange has not completed
    #[error("Contact {0} has not announced a public key yet")]
    ContactNotReady(String),

    // ========================================================================
    // Network Errors (500-599)
    // ========================================================================

    /// Failed to connect to the relay
    #[error("Failed to connect to relay: {0}")]
    ConnectionFailed(String),

    /// The connection task is gone
    #[error("Not connected to a relay.")]
    NotConnected,

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Numeric error code, grouped by category:
    /// - 300-399: Crypto
    /// - 500-599: Network
    /// - 600-699: Contacts
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidKey(_) => 300,
            Error::KeyAgreementFailed(_) => 301,
            Error::EncryptionFailed(_) => 302,
            Error::DecryptionFailed(_) => 303,

            Error::ConnectionFailed(_) => 500,
            Error::NotConnected => 501,

            Error::UnknownContact(_) => 600,
            Error::ContactNotReady(_) => 601,

            Error::SerializationError(_) => 900,
        }
    }

    /// Whether the error was caused by data received from a peer.
    ///
    /// These are reported to the user and never tear down the session.
    pub fn is_peer_fault(&self) -> bool {
        matches!(
            self,
            Error::InvalidKey(_) | Error::KeyAgreementFailed(_) | Error::DecryptionFailed(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::ConnectionFailed(err.to_string())
    }
}
