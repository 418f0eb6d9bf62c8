//! # Key Derivation
//!
//! ```text
//! own X25519 secret × peer X25519 public ──► DH output (32 bytes)
//!                                               │
//!                    HKDF-SHA256(ikm = DH output, salt = none,
//!                                info = "hush-message-key-v1")
//!                                               │
//!                                               ▼
//!                                  AES-256-GCM message key
//! ```
//!
//! Neither the salt nor the info depend on which side runs the derivation,
//! so both peers end up with the same key.

use hkdf::Hkdf;
use sha2::Sha256;

use super::encryption::{SharedKey, KEY_SIZE};
use super::keys::{KeyPair, PeerPublicKey};
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
pub mod domain {
    /// Domain for per-peer message key derivation
    pub const MESSAGE_KEY: &[u8] = b"hush-message-key-v1";
}

/// Derive the symmetric key shared with one peer.
///
/// ## Errors
///
/// `KeyAgreementFailed` when the peer's key is a low-order point (the DH
/// output would be all zeros and known to everyone) or HKDF expansion fails.
pub fn derive_shared_key(own: &KeyPair, peer: &PeerPublicKey) -> Result<SharedKey> {
    let dh_output = own.diffie_hellman(peer);
    if !dh_output.was_contributory() {
        return Err(Error::KeyAgreementFailed(
            "peer public key is a low-order point".into(),
        ));
    }

    let hkdf = Hkdf::<Sha256>::new(None, dh_output.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(domain::MESSAGE_KEY, &mut key)
        .map_err(|_| Error::KeyAgreementFailed("HKDF expansion failed".into()))?;

    Ok(SharedKey::from_bytes(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_symmetric() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let alice_key = derive_shared_key(&alice, &bob.public_key()).unwrap();
        let bob_key = derive_shared_key(&bob, &alice.public_key()).unwrap();

        assert_eq!(alice_key.as_bytes(), bob_key.as_bytes());
    }

    #[test]
    fn test_derivation_differs_per_peer() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let carol = KeyPair::generate();

        let with_bob = derive_shared_key(&alice, &bob.public_key()).unwrap();
        let with_carol = derive_shared_key(&alice, &carol.public_key()).unwrap();

        assert_ne!(with_bob.as_bytes(), with_carol.as_bytes());
    }

    #[test]
    fn test_key_is_not_raw_dh_output() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let raw = alice.diffie_hellman(&bob.public_key());
        let key = derive_shared_key(&alice, &bob.public_key()).unwrap();

        assert_ne!(key.as_bytes(), raw.as_bytes());
    }

    #[test]
    fn test_low_order_point_rejected() {
        let alice = KeyPair::generate();
        let zero = PeerPublicKey::from_bytes([0u8; 32]);

        let result = derive_shared_key(&alice, &zero);
        assert!(matches!(result, Err(Error::KeyAgreementFailed(_))));
    }
}
