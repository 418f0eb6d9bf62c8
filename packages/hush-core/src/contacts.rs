//! # Contacts
//!
//! One [`Contact`] per remote participant this client has heard about.
//!
//! ## Key Exchange Progress
//!
//! ```text
//!   (unknown)
//!       │  roster / joined notice / first key announcement
//!       ▼
//!  ┌────────────┐   key announced, import + agreement ok   ┌────────────┐
//!  │ KeyPending │─────────────────────────────────────────►│  KeyReady  │
//!  └────────────┘                                          └────────────┘
//!       │ ▲  import or agreement failed: stays pending           │
//!       └─┘                                                       │
//!       │                     left notice                        │
//!       └──────────────────────────┬──────────────────────────────┘
//!                                  ▼
//!                              (removed)
//! ```
//!
//! A contact holds a public key if and only if it also holds the shared key
//! derived from it; both arrive together in [`KeyState::Ready`]. Once ready,
//! further announcements from the same peer are ignored until the contact is
//! removed.

use std::collections::BTreeMap;

use crate::crypto::{derive_shared_key, KeyPair, PeerPublicKey, SharedKey};
use crate::error::{Error, Result};

/// Key exchange state of a contact
#[derive(Debug)]
pub enum KeyState {
    /// Peer is known, no usable key yet
    Pending,
    /// Peer's key imported and the shared key derived
    Ready {
        public_key: PeerPublicKey,
        shared_key: SharedKey,
    },
}

/// A remote participant as seen by this client
#[derive(Debug)]
pub struct Contact {
    peer_id: String,
    state: KeyState,
}

impl Contact {
    fn pending(peer_id: &str) -> Self {
        Self {
            peer_id: peer_id.to_string(),
            state: KeyState::Pending,
        }
    }

    /// Relay-assigned id of the peer
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Current key exchange state
    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Whether messages can be sealed for this peer
    pub fn is_ready(&self) -> bool {
        matches!(self.state, KeyState::Ready { .. })
    }

    /// The peer's public key, once announced
    pub fn public_key(&self) -> Option<&PeerPublicKey> {
        match &self.state {
            KeyState::Ready { public_key, .. } => Some(public_key),
            KeyState::Pending => None,
        }
    }

    /// The key shared with this peer, once derived
    pub fn shared_key(&self) -> Option<&SharedKey> {
        match &self.state {
            KeyState::Ready { shared_key, .. } => Some(shared_key),
            KeyState::Pending => None,
        }
    }

    /// A copyable view for UIs
    pub fn summary(&self) -> ContactSummary {
        ContactSummary {
            peer_id: self.peer_id.clone(),
            key_ready: self.is_ready(),
        }
    }
}

/// Display-only snapshot of a contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSummary {
    pub peer_id: String,
    pub key_ready: bool,
}

/// Result of handling a key announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInstall {
    /// The contact moved to `Ready`
    Derived,
    /// The contact was already `Ready`; nothing changed
    AlreadyReady,
}

/// All contacts of one running client, keyed by peer id
#[derive(Debug, Default)]
pub struct ContactBook {
    contacts: BTreeMap<String, Contact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a contact exists for `peer_id`.
    ///
    /// Returns `true` if it was created by this call.
    pub fn ensure(&mut self, peer_id: &str) -> bool {
        if self.contacts.contains_key(peer_id) {
            return false;
        }
        self.contacts
            .insert(peer_id.to_string(), Contact::pending(peer_id));
        true
    }

    /// Record a peer's announced key and derive the shared key.
    ///
    /// The contact is created if needed. On any import or agreement error it
    /// is left (or created) in `Pending`.
    pub fn install_key(&mut self, own: &KeyPair, peer_id: &str, public_key_pem: &str) -> Result<KeyInstall> {
        self.ensure(peer_id);
        let contact = self
            .contacts
            .get_mut(peer_id)
            .ok_or_else(|| Error::UnknownContact(peer_id.to_string()))?;

        if contact.is_ready() {
            return Ok(KeyInstall::AlreadyReady);
        }

        let public_key = PeerPublicKey::from_pem(public_key_pem)?;
        let shared_key = derive_shared_key(own, &public_key)?;
        contact.state = KeyState::Ready {
            public_key,
            shared_key,
        };

        Ok(KeyInstall::Derived)
    }

    /// Forget a peer, dropping (and zeroizing) its shared key.
    pub fn remove(&mut self, peer_id: &str) -> Option<Contact> {
        self.contacts.remove(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&Contact> {
        self.contacts.get(peer_id)
    }

    /// The key to seal messages for `peer_id`.
    ///
    /// ## Errors
    ///
    /// `UnknownContact` if the peer was never seen, `ContactNotReady` if it
    /// has not announced a usable key.
    pub fn shared_key(&self, peer_id: &str) -> Result<&SharedKey> {
        let contact = self
            .contacts
            .get(peer_id)
            .ok_or_else(|| Error::UnknownContact(peer_id.to_string()))?;

        contact
            .shared_key()
            .ok_or_else(|| Error::ContactNotReady(peer_id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn summaries(&self) -> Vec<ContactSummary> {
        self.iter().map(Contact::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_pending_once() {
        let mut book = ContactBook::new();

        assert!(book.ensure("peer-a"));
        assert!(!book.ensure("peer-a"));
        assert_eq!(book.len(), 1);

        let contact = book.get("peer-a").unwrap();
        assert!(!contact.is_ready());
        assert!(contact.public_key().is_none());
        assert!(contact.shared_key().is_none());
    }

    #[test]
    fn test_install_key_makes_contact_ready() {
        let own = KeyPair::generate();
        let peer = KeyPair::generate();
        let mut book = ContactBook::new();
        book.ensure("peer-a");

        let outcome = book
            .install_key(&own, "peer-a", &peer.export_public_key())
            .unwrap();

        assert_eq!(outcome, KeyInstall::Derived);
        let contact = book.get("peer-a").unwrap();
        assert!(contact.is_ready());
        assert_eq!(contact.public_key(), Some(&peer.public_key()));
        assert!(contact.shared_key().is_some());
    }

    #[test]
    fn test_install_key_creates_unknown_contact() {
        let own = KeyPair::generate();
        let peer = KeyPair::generate();
        let mut book = ContactBook::new();

        book.install_key(&own, "late", &peer.export_public_key())
            .unwrap();

        assert!(book.get("late").unwrap().is_ready());
    }

    #[test]
    fn test_second_announcement_is_not_rederived() {
        let own = KeyPair::generate();
        let first = KeyPair::generate();
        let second = KeyPair::generate();
        let mut book = ContactBook::new();

        book.install_key(&own, "peer-a", &first.export_public_key())
            .unwrap();
        let before = *book.shared_key("peer-a").unwrap().as_bytes();

        let outcome = book
            .install_key(&own, "peer-a", &second.export_public_key())
            .unwrap();

        assert_eq!(outcome, KeyInstall::AlreadyReady);
        assert_eq!(book.shared_key("peer-a").unwrap().as_bytes(), &before);
        assert_eq!(book.get("peer-a").unwrap().public_key(), Some(&first.public_key()));
    }

    #[test]
    fn test_malformed_key_leaves_contact_pending() {
        let own = KeyPair::generate();
        let mut book = ContactBook::new();

        let result = book.install_key(&own, "peer-a", "not a key");

        assert!(matches!(result, Err(Error::InvalidKey(_))));
        let contact = book.get("peer-a").unwrap();
        assert!(!contact.is_ready());
    }

    #[test]
    fn test_low_order_key_leaves_contact_pending() {
        let own = KeyPair::generate();
        let mut book = ContactBook::new();
        let zero = PeerPublicKey::from_bytes([0u8; 32]).to_pem();

        let result = book.install_key(&own, "peer-a", &zero);

        assert!(matches!(result, Err(Error::KeyAgreementFailed(_))));
        assert!(!book.get("peer-a").unwrap().is_ready());
    }

    #[test]
    fn test_shared_key_errors() {
        let mut book = ContactBook::new();
        book.ensure("pending");

        assert!(matches!(book.shared_key("nobody"), Err(Error::UnknownContact(_))));
        assert!(matches!(book.shared_key("pending"), Err(Error::ContactNotReady(_))));
    }

    #[test]
    fn test_remove_then_rederive() {
        let own = KeyPair::generate();
        let first = KeyPair::generate();
        let second = KeyPair::generate();
        let mut book = ContactBook::new();

        book.install_key(&own, "peer-a", &first.export_public_key())
            .unwrap();
        assert!(book.remove("peer-a").is_some());
        assert!(book.get("peer-a").is_none());
        assert!(book.remove("peer-a").is_none());

        book.install_key(&own, "peer-a", &second.export_public_key())
            .unwrap();
        assert_eq!(book.get("peer-a").unwrap().public_key(), Some(&second.public_key()));
    }

    #[test]
    fn test_summaries_are_sorted_by_peer_id() {
        let mut book = ContactBook::new();
        book.ensure("b");
        book.ensure("a");

        let ids: Vec<String> = book.summaries().into_iter().map(|s| s.peer_id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
