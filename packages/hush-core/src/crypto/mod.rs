//! # Cryptography Module
//!
//! The primitives a participant needs to talk to peers through a relay that
//! must never see plaintext.
//!
//! ## Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    PER-PEER ENCRYPTION                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Startup: fresh X25519 key pair, public half exported as PEM        │
//! │     (SubjectPublicKeyInfo, base64, 64-column lines)                    │
//! │                                                                         │
//! │  2. Key Exchange: X25519 ECDH                                          │
//! │     Own Private × Peer Public = DH output (same on both sides)         │
//! │                                                                         │
//! │  3. Key Derivation: HKDF-SHA256                                        │
//! │     DH output → 256-bit message key                                    │
//! │                                                                         │
//! │  4. Encryption: AES-256-GCM                                            │
//! │     • 96-bit nonce, fresh from the OS RNG for every message            │
//! │     • 128-bit authentication tag                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Considerations
//!
//! 1. **Ephemeral identity**: the key pair lives only as long as the process
//! 2. **Key Zeroization**: secret keys and message keys are zeroized on drop
//! 3. **No Nonce Reuse**: every seal draws a new random nonce
//! 4. **No key verification**: nothing binds a relay-assigned id to the key
//!    it announces, so a malicious relay can substitute keys (MITM)

mod encryption;
mod kdf;
mod keys;

pub use encryption::{decrypt, encrypt, Nonce, SharedKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use kdf::derive_shared_key;
pub use keys::{KeyPair, PeerPublicKey, PUBLIC_KEY_SIZE};
