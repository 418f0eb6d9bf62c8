//! `hush`: line-based terminal client.
//!
//! Connects to a relay with a fresh identity, prints what happens and sends
//! typed lines, sealed, to the active contact.

mod commands;
mod view;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::io::{AsyncBufReadExt, BufReader};

use hush_core::{ClientEvent, Identity, RelayHandle};

use commands::{Command, HELP};
use view::ChatView;

#[derive(Parser, Debug)]
#[command(name = "hush", version, about = "End-to-end encrypted chat over a hush relay")]
struct Args {
    /// Relay WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws", env = "HUSH_RELAY_URL")]
    relay: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Diagnostics go to stderr so they do not interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hush=warn,hush_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let identity = Identity::generate();
    let own_key = identity.public_key_pem().to_string();

    let (handle, mut events) = hush_core::connect(&args.relay, identity)
        .await
        .wrap_err_with(|| format!("could not connect to {}", args.relay))?;

    println!("* type /help for commands");

    let mut view = ChatView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                for line in view.apply(&event) {
                    println!("{}", line);
                }
                if event == ClientEvent::Disconnected {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    stdin_open = false;
                    handle.close();
                    continue;
                };
                if !run_command(Command::parse(&line), &handle, &mut view, &own_key).await {
                    handle.close();
                }
            }
        }
    }

    Ok(())
}

/// Execute one command. Returns `false` when the user asked to leave.
async fn run_command(command: Command, handle: &RelayHandle, view: &mut ChatView, own_key: &str) -> bool {
    match command {
        Command::Empty => {}
        Command::Quit => return false,
        Command::Help => println!("{}", HELP),
        Command::Key => {
            if let Some(id) = view.own_id() {
                println!("* your id: {}", id);
            }
            println!("{}", own_key);
        }
        Command::Peers => match handle.contacts().await {
            Ok(contacts) => {
                for line in view.peer_lines(&contacts) {
                    println!("{}", line);
                }
            }
            Err(e) => println!("! {}", e),
        },
        Command::To(query) => match view.resolve(&query) {
            Ok(peer_id) => println!("{}", view.set_active(peer_id)),
            Err(e) => println!("! {}", e),
        },
        Command::Msg { peer, text } => match view.resolve(&peer) {
            Ok(peer_id) => send(handle, view, &peer_id, &text).await,
            Err(e) => println!("! {}", e),
        },
        Command::Say(text) => match view.active().map(str::to_string) {
            Some(peer_id) => send(handle, view, &peer_id, &text).await,
            None => println!("! nobody to talk to yet"),
        },
        Command::Invalid(hint) => println!("! {}", hint),
    }
    true
}

async fn send(handle: &RelayHandle, view: &ChatView, peer_id: &str, text: &str) {
    match handle.send_text(peer_id, text).await {
        Ok(()) => println!("{}", view.outgoing(peer_id, text)),
        Err(e) => {
            tracing::warn!(peer = peer_id, code = e.code(), error = %e, "Message not sent");
            println!("! {}", e);
        }
    }
}
