//! # Own Identity
//!
//! The key pair a participant generates at startup. It is held for the
//! lifetime of the process, never persisted, and only its public half is
//! ever sent anywhere.
//!
//! The relay-assigned client id is *not* part of the identity: it changes
//! on every connection and is tracked by the client state machine.

use crate::crypto::{KeyPair, PeerPublicKey};

/// This participant's key material
#[derive(Debug)]
pub struct Identity {
    key_pair: KeyPair,
    public_key_pem: String,
}

impl Identity {
    /// Create a fresh identity with a new random key pair
    pub fn generate() -> Self {
        Self::from_key_pair(KeyPair::generate())
    }

    /// Wrap an existing key pair
    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        let public_key_pem = key_pair.export_public_key();
        Self {
            key_pair,
            public_key_pem,
        }
    }

    /// PEM text of our public key, as announced to peers
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    pub fn public_key(&self) -> PeerPublicKey {
        self.key_pair.public_key()
    }

    pub(crate) fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}
