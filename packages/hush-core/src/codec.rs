//! # Message Codec
//!
//! Frames chat text for the relay: UTF-8 plaintext is sealed with the peer's
//! shared key and both the nonce and the ciphertext are carried as standard
//! base64 strings.
//!
//! ```text
//! { "nonce": "<16 base64 chars>", "ciphertext": "<base64 of ct || tag>" }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::crypto::{self, Nonce, SharedKey, NONCE_SIZE};
use crate::error::{Error, Result};

/// A sealed chat message, as embedded in a `cipher-message` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// Base64 AES-GCM nonce
    pub nonce: String,
    /// Base64 ciphertext with the authentication tag appended
    pub ciphertext: String,
}

/// Seal plaintext under a shared key.
///
/// Every call draws a fresh nonce, so sealing the same text twice never
/// yields the same frame.
pub fn seal(key: &SharedKey, plaintext: &str) -> Result<SealedMessage> {
    let (nonce, ciphertext) = crypto::encrypt(key, plaintext.as_bytes())?;

    Ok(SealedMessage {
        nonce: STANDARD.encode(nonce.as_bytes()),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Open a sealed message.
///
/// ## Errors
///
/// `DecryptionFailed` for anything that does not authenticate: bad base64,
/// a nonce of the wrong length, a wrong key, altered bytes, or a plaintext
/// that is not UTF-8.
pub fn open(key: &SharedKey, sealed: &SealedMessage) -> Result<String> {
    let nonce_bytes = STANDARD
        .decode(&sealed.nonce)
        .map_err(|e| Error::DecryptionFailed(format!("nonce is not base64: {}", e)))?;
    let nonce: [u8; NONCE_SIZE] = nonce_bytes.as_slice().try_into().map_err(|_| {
        Error::DecryptionFailed(format!(
            "nonce must be {} bytes, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        ))
    })?;

    let ciphertext = STANDARD
        .decode(&sealed.ciphertext)
        .map_err(|e| Error::DecryptionFailed(format!("ciphertext is not base64: {}", e)))?;

    let plaintext = crypto::decrypt(key, &Nonce::from_bytes(nonce), &ciphertext)?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::DecryptionFailed("plaintext is not valid UTF-8".into()))
}
