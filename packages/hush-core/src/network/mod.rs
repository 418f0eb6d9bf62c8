//! # Network Module
//!
//! Everything between a participant and the relay.
//!
//! ```text
//!   UI ──► RelayHandle ──► relay_client task ──► WebSocket ──► relay
//!                              │
//!                              ▼
//!                          ChatClient (pure state machine)
//!                              │
//!                              ▼
//!   UI ◄── ClientEvent ◄───────┘
//! ```
//!
//! - [`protocol`] - JSON envelopes exchanged with the relay
//! - [`client`] - Reacts to relay envelopes, no I/O
//! - [`events`] - What the UI is told about
//! - [`relay_client`] - The tokio task that owns the socket

pub mod client;
pub mod events;
pub mod protocol;
pub mod relay_client;

pub use client::{ChatClient, ClientAction};
pub use events::ClientEvent;
pub use protocol::{ClientMessage, ServerMessage};
pub use relay_client::{connect, spawn, RelayHandle};
