//! Parsing of input lines.
//!
//! Lines starting with `/` are commands; anything else is chat text for the
//! active contact.

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat text for the active contact
    Say(String),
    /// `/to <peer>`: pick the active contact by id or id prefix
    To(String),
    /// `/msg <peer> <text>`: one message to a specific contact
    Msg { peer: String, text: String },
    /// `/peers`
    Peers,
    /// `/key`: print our public key
    Key,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Blank line
    Empty,
    /// Malformed or unknown command, with a usage hint
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  /peers              list contacts and their key status
  /to <peer>          choose who plain lines are sent to (id or prefix)
  /msg <peer> <text>  send one message to a contact
  /key                show your public key
  /quit               leave
Anything else is sent to the active contact.";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        match name {
            "peers" | "p" => Command::Peers,
            "key" => Command::Key,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "to" if !args.is_empty() => Command::To(args.to_string()),
            "to" => Command::Invalid("usage: /to <peer>".into()),
            "msg" | "m" => match args.split_once(char::is_whitespace) {
                Some((peer, text)) if !text.trim().is_empty() => Command::Msg {
                    peer: peer.to_string(),
                    text: text.trim().to_string(),
                },
                _ => Command::Invalid("usage: /msg <peer> <text>".into()),
            },
            other => Command::Invalid(format!("unknown command /{} (try /help)", other)),
        }
    }
}
