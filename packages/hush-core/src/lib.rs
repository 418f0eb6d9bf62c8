//! # Hush Core
//!
//! Participant side of hush: an end-to-end encrypted group chat where a
//! relay forwards opaque envelopes and never holds a key.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HUSH CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │  Contacts   │  │   Codec     │  │   Network    │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Keypair   │  │ - Pending   │  │ - Seal      │  │ - Envelopes  │   │
//! │  │ - PEM       │  │ - Ready     │  │ - Open      │  │ - ChatClient │   │
//! │  │             │  │ - Shared key│  │ - Base64    │  │ - Relay task │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  ▼                                      │
//! │                      ┌──────────────────────┐                           │
//! │                      │        Crypto        │                           │
//! │                      │                      │                           │
//! │                      │ - X25519 agreement   │                           │
//! │                      │ - HKDF-SHA256        │                           │
//! │                      │ - AES-256-GCM        │                           │
//! │                      └──────────────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Key pairs, key agreement and authenticated encryption
//! - [`identity`] - The per-session key pair and its exported public key
//! - [`codec`] - Sealing chat text into wire frames and back
//! - [`contacts`] - Per-peer key exchange state
//! - [`network`] - Relay envelopes, the client state machine, the relay task
//!
//! ## Security Model
//!
//! Each session generates a fresh key pair. Public keys are announced through
//! the relay; each pair of participants derives a shared AES-256-GCM key that
//! the relay never sees. Keys are not authenticated: an active relay can
//! substitute its own and read traffic.

#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod codec;
pub mod contacts;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod network;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use codec::SealedMessage;
pub use contacts::{ContactBook, ContactSummary};
pub use error::{Error, Result};
pub use identity::Identity;
pub use network::{connect, ChatClient, ClientEvent, RelayHandle};
