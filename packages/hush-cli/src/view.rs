//! Terminal-side view of the chat: who is around, who plain lines go to,
//! and how events are rendered.

use std::collections::BTreeMap;

use hush_core::{ClientEvent, ContactSummary};

/// Characters of a peer id shown in the transcript
const SHORT_ID: usize = 8;

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

#[derive(Debug, Default)]
pub struct ChatView {
    own_id: Option<String>,
    /// peer id -> key ready
    peers: BTreeMap<String, bool>,
    active: Option<String>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn own_id(&self) -> Option<&str> {
        self.own_id.as_deref()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Find a peer by full id or unique prefix.
    pub fn resolve(&self, query: &str) -> Result<String, String> {
        if self.peers.contains_key(query) {
            return Ok(query.to_string());
        }
        let matches: Vec<&String> = self.peers.keys().filter(|id| id.starts_with(query)).collect();
        match matches.as_slice() {
            [only] => Ok((*only).clone()),
            [] => Err(format!("no peer matches '{}'", query)),
            _ => Err(format!("'{}' matches {} peers, type more of the id", query, matches.len())),
        }
    }

    pub fn set_active(&mut self, peer_id: String) -> String {
        let line = format!("* now talking to {}{}", short_id(&peer_id), self.key_note(&peer_id));
        self.active = Some(peer_id);
        line
    }

    /// One line per contact, marking the active one.
    pub fn peer_lines(&self, contacts: &[ContactSummary]) -> Vec<String> {
        if contacts.is_empty() {
            return vec!["* waiting for someone to connect".to_string()];
        }
        contacts
            .iter()
            .map(|contact| {
                let marker = if self.active() == Some(contact.peer_id.as_str()) { ">" } else { " " };
                let status = if contact.key_ready { "key ready" } else { "waiting for key" };
                format!("{} {}  {}", marker, contact.peer_id, status)
            })
            .collect()
    }

    fn key_note(&self, peer_id: &str) -> &'static str {
        match self.peers.get(peer_id) {
            Some(true) => "",
            _ => " (waiting for key)",
        }
    }

    fn add_peer(&mut self, peer_id: &str) {
        self.peers.entry(peer_id.to_string()).or_insert(false);
        if self.active.is_none() {
            self.active = Some(peer_id.to_string());
        }
    }

    /// Update from an event and return what to print.
    pub fn apply(&mut self, event: &ClientEvent) -> Vec<String> {
        match event {
            ClientEvent::Welcomed { client_id, roster } => {
                self.own_id = Some(client_id.clone());
                for peer_id in roster {
                    self.add_peer(peer_id);
                }
                vec![format!(
                    "* connected as {} ({} other{} online)",
                    short_id(client_id),
                    roster.len(),
                    if roster.len() == 1 { "" } else { "s" }
                )]
            }
            ClientEvent::PeerJoined { peer_id } => {
                self.add_peer(peer_id);
                vec![format!("* {} joined", short_id(peer_id))]
            }
            ClientEvent::PeerLeft { peer_id } => {
                self.peers.remove(peer_id);
                let mut lines = vec![format!("* {} left", short_id(peer_id))];
                if self.active.as_deref() == Some(peer_id.as_str()) {
                    self.active = self.peers.keys().next().cloned();
                    if let Some(next) = &self.active {
                        lines.push(format!("* now talking to {}", short_id(next)));
                    }
                }
                lines
            }
            ClientEvent::PeerKeyReady { peer_id } => {
                self.add_peer(peer_id);
                self.peers.insert(peer_id.clone(), true);
                vec![format!("* key exchange with {} complete", short_id(peer_id))]
            }
            ClientEvent::KeyRejected { peer_id, reason } => {
                self.add_peer(peer_id);
                vec![format!("! unusable key from {}: {}", short_id(peer_id), reason)]
            }
            ClientEvent::MessageReceived { from, text } => {
                vec![format!("{} <{}> {}", timestamp(), short_id(from), text)]
            }
            ClientEvent::Undecryptable { from, .. } => {
                vec![format!("! could not decrypt a message from {}", short_id(from))]
            }
            ClientEvent::RelayError { message } => vec![format!("! relay: {}", message)],
            ClientEvent::Disconnected => vec!["* disconnected from relay".to_string()],
        }
    }

    /// Line echoed for our own outgoing message
    pub fn outgoing(&self, to: &str, text: &str) -> String {
        format!("{} <you -> {}> {}", timestamp(), short_id(to), text)
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn welcomed(view: &mut ChatView, roster: &[&str]) {
        view.apply(&ClientEvent::Welcomed {
            client_id: "me-0000000000".into(),
            roster: roster.iter().map(|s| s.to_string()).collect(),
        });
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_first_peer_becomes_active() {
        let mut view = ChatView::new();
        welcomed(&mut view, &["bbbb", "aaaa"]);
        assert_eq!(view.active(), Some("bbbb"));

        let mut empty = ChatView::new();
        welcomed(&mut empty, &[]);
        assert_eq!(empty.active(), None);
        empty.apply(&ClientEvent::PeerJoined { peer_id: "cccc".into() });
        assert_eq!(empty.active(), Some("cccc"));
    }

    #[test]
    fn test_active_moves_on_when_peer_leaves() {
        let mut view = ChatView::new();
        welcomed(&mut view, &["aaaa", "bbbb"]);
        assert_eq!(view.active(), Some("aaaa"));

        let lines = view.apply(&ClientEvent::PeerLeft { peer_id: "aaaa".into() });
        assert_eq!(view.active(), Some("bbbb"));
        assert_eq!(lines.len(), 2);

        view.apply(&ClientEvent::PeerLeft { peer_id: "bbbb".into() });
        assert_eq!(view.active(), None);
    }

    #[test]
    fn test_resolve_by_prefix() {
        let mut view = ChatView::new();
        welcomed(&mut view, &["abc123", "abd456", "xyz"]);

        assert_eq!(view.resolve("x"), Ok("xyz".to_string()));
        assert_eq!(view.resolve("abc"), Ok("abc123".to_string()));
        assert!(view.resolve("ab").is_err());
        assert!(view.resolve("q").is_err());
    }

    #[test]
    fn test_peer_lines_show_key_status() {
        let mut view = ChatView::new();
        welcomed(&mut view, &["aaaa", "bbbb"]);
        let contacts = vec![
            ContactSummary {
                peer_id: "aaaa".into(),
                key_ready: false,
            },
            ContactSummary {
                peer_id: "bbbb".into(),
                key_ready: true,
            },
        ];

        let lines = view.peer_lines(&contacts);
        assert_eq!(lines, vec!["> aaaa  waiting for key", "  bbbb  key ready"]);
    }

    #[test]
    fn test_no_peers_yet() {
        let view = ChatView::new();
        assert_eq!(view.peer_lines(&[]), vec!["* waiting for someone to connect"]);
    }

    #[test]
    fn test_undecryptable_does_not_show_reason() {
        let mut view = ChatView::new();
        let lines = view.apply(&ClientEvent::Undecryptable {
            from: "aaaa".into(),
            reason: "aead::Error".into(),
        });
        assert_eq!(lines, vec!["! could not decrypt a message from aaaa"]);
    }
}
