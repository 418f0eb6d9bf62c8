//! # Key Management
//!
//! The participant's own X25519 key pair and the public keys announced by
//! peers.
//!
//! ## Public Key Text Form
//!
//! ```text
//! -----BEGIN PUBLIC KEY-----
//! MCowBQYDK2VuAyEA<43 more base64 chars of the 32-byte key>
//! -----END PUBLIC KEY-----
//! ```
//!
//! The body is a DER SubjectPublicKeyInfo for X25519 (RFC 8410,
//! OID 1.3.101.110) so the same text can be pasted by hand, shown in a UI or
//! sent over the relay.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret as DhOutput, StaticSecret};

use crate::error::{Error, Result};

/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// DER header of an X25519 SubjectPublicKeyInfo; the raw key follows it.
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

const PEM_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_END: &str = "-----END PUBLIC KEY-----";
const PEM_LINE_WIDTH: usize = 64;

/// X25519 key pair held for the lifetime of one running participant.
///
/// The private half never leaves this struct: it is not serializable, not
/// printed by `Debug`. `StaticSecret` wipes itself on drop (x25519-dalek's
/// `zeroize` feature).
pub struct KeyPair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair from the OS RNG
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Create from raw secret bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let secret = StaticSecret::from(*bytes);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The shareable half of this key pair
    pub fn public_key(&self) -> PeerPublicKey {
        PeerPublicKey(self.public.to_bytes())
    }

    /// Export the public half as PEM text
    pub fn export_public_key(&self) -> String {
        self.public_key().to_pem()
    }

    /// Raw X25519 Diffie-Hellman with a peer's public key.
    ///
    /// Callers go through [`derive_shared_key`](super::derive_shared_key),
    /// which rejects non-contributory results and runs the KDF.
    pub(crate) fn diffie_hellman(&self, their_public: &PeerPublicKey) -> DhOutput {
        let their_public = X25519PublicKey::from(their_public.0);
        self.secret.diffie_hellman(&their_public)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// A peer's X25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerPublicKey([u8; PUBLIC_KEY_SIZE]);

impl PeerPublicKey {
    /// Create from raw key bytes
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Encode as PEM (SubjectPublicKeyInfo, base64, 64-column lines)
    pub fn to_pem(&self) -> String {
        let mut der = Vec::with_capacity(X25519_SPKI_PREFIX.len() + PUBLIC_KEY_SIZE);
        der.extend_from_slice(&X25519_SPKI_PREFIX);
        der.extend_from_slice(&self.0);
        let body = STANDARD.encode(der);

        let mut pem = String::with_capacity(body.len() + PEM_BEGIN.len() + PEM_END.len() + 4);
        pem.push_str(PEM_BEGIN);
        pem.push('\n');
        for (i, ch) in body.chars().enumerate() {
            if i > 0 && i % PEM_LINE_WIDTH == 0 {
                pem.push('\n');
            }
            pem.push(ch);
        }
        pem.push('\n');
        pem.push_str(PEM_END);
        pem
    }

    /// Decode from PEM text.
    ///
    /// Any whitespace layout between the markers is accepted, so keys that
    /// were re-wrapped by a mail client or a chat box still import.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let body = pem
            .trim()
            .strip_prefix(PEM_BEGIN)
            .and_then(|rest| rest.strip_suffix(PEM_END))
            .ok_or_else(|| Error::InvalidKey("missing PUBLIC KEY markers".into()))?;

        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD
            .decode(compact)
            .map_err(|e| Error::InvalidKey(format!("Invalid base64: {}", e)))?;

        let raw = der
            .strip_prefix(&X25519_SPKI_PREFIX[..])
            .ok_or_else(|| Error::InvalidKey("not an X25519 SubjectPublicKeyInfo".into()))?;

        let bytes: [u8; PUBLIC_KEY_SIZE] = raw
            .try_into()
            .map_err(|_| Error::InvalidKey(format!("expected {} key bytes, got {}", PUBLIC_KEY_SIZE, raw.len())))?;

        Ok(Self(bytes))
    }
}

impl fmt::Debug for PeerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerPublicKey({})", STANDARD.encode(self.0))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();

        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_keypair_from_bytes_is_deterministic() {
        let kp1 = KeyPair::from_bytes(&[7u8; 32]);
        let kp2 = KeyPair::from_bytes(&[7u8; 32]);

        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_diffie_hellman() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let alice_shared = alice.diffie_hellman(&bob.public_key());
        let bob_shared = bob.diffie_hellman(&alice.public_key());

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_pem_layout() {
        let pem = KeyPair::generate().export_public_key();
        let lines: Vec<&str> = pem.lines().collect();

        assert_eq!(lines.first(), Some(&PEM_BEGIN));
        assert_eq!(lines.last(), Some(&PEM_END));
        assert!(lines[1].starts_with("MCowBQYDK2VuAyEA"));
        assert!(lines[1..lines.len() - 1].iter().all(|l| l.len() <= PEM_LINE_WIDTH));
        assert!(!pem.ends_with('\n'));
    }

    #[test]
    fn test_pem_import_export() {
        let public = KeyPair::generate().public_key();
        let restored = PeerPublicKey::from_pem(&public.to_pem()).unwrap();

        assert_eq!(public, restored);
    }

    #[test]
    fn test_pem_import_tolerates_rewrapping() {
        let public = KeyPair::generate().public_key();
        let pem = public.to_pem();
        let body = pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect::<String>();
        let (head, tail) = body.split_at(10);
        let rewrapped = format!("\n  {}\r\n{}\n{}\t{}  \n", PEM_BEGIN, head, tail, PEM_END);

        assert_eq!(PeerPublicKey::from_pem(&rewrapped).unwrap(), public);
    }

    #[test]
    fn test_pem_missing_markers_rejected() {
        let pem = KeyPair::generate().export_public_key();
        let no_end = pem.replace(PEM_END, "");
        let private_label = pem.replace("PUBLIC KEY", "PRIVATE KEY");

        assert!(matches!(PeerPublicKey::from_pem(&no_end), Err(Error::InvalidKey(_))));
        assert!(matches!(PeerPublicKey::from_pem(&private_label), Err(Error::InvalidKey(_))));
        assert!(PeerPublicKey::from_pem("hello").is_err());
    }

    #[test]
    fn test_pem_bad_base64_rejected() {
        let pem = format!("{}\n!!!not base64!!!\n{}", PEM_BEGIN, PEM_END);
        assert!(matches!(PeerPublicKey::from_pem(&pem), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_pem_foreign_algorithm_rejected() {
        // Ed25519 SPKI (OID 1.3.101.112) has the same shape but another OID
        let mut der = vec![0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00];
        der.extend_from_slice(&[9u8; 32]);
        let pem = format!("{}\n{}\n{}", PEM_BEGIN, STANDARD.encode(der), PEM_END);

        assert!(matches!(PeerPublicKey::from_pem(&pem), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_pem_truncated_key_rejected() {
        let mut der = X25519_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&[9u8; 31]);
        let pem = format!("{}\n{}\n{}", PEM_BEGIN, STANDARD.encode(der), PEM_END);

        assert!(matches!(PeerPublicKey::from_pem(&pem), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let secret = [0x42u8; 32];
        let kp = KeyPair::from_bytes(&secret);
        let printed = format!("{:?}", kp);

        assert!(printed.contains("public"));
        assert!(!printed.contains(&STANDARD.encode(secret)));
    }

    #[test]
    fn test_secret_half_wipes_itself_on_drop() {
        fn wipes_on_drop<T: zeroize::ZeroizeOnDrop>() {}
        wipes_on_drop::<StaticSecret>();
    }
}
