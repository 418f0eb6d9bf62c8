//! `hush-relay` binary: parse configuration, set up logging, serve.

use std::net::IpAddr;

use clap::{Parser, ValueEnum};

use hush_relay::{router, RelayConfig, SessionRegistry};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "hush-relay", version, about = "Hush end-to-end encrypted chat relay")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "HUSH_HOST")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "PORT")]
    port: u16,

    /// Largest inbound WebSocket message accepted, in bytes
    #[arg(long, default_value_t = 65536, env = "HUSH_MAX_MESSAGE_BYTES")]
    max_message_bytes: usize,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "HUSH_LOG_FORMAT")]
    log_format: LogFormat,
}

impl From<&Args> for RelayConfig {
    fn from(args: &Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_message_bytes: args.max_message_bytes,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hush_relay=info,tower_http=info".into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = RelayConfig::from(&args);
    let addr = config.socket_addr();
    let app = router(SessionRegistry::new(), config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Hush relay server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        for var in ["HUSH_HOST", "PORT", "HUSH_MAX_MESSAGE_BYTES", "HUSH_LOG_FORMAT"] {
            std::env::remove_var(var);
        }
        let args = Args::try_parse_from(["hush-relay"]).unwrap();
        let config = RelayConfig::from(&args);

        assert_eq!(config.port, 3000);
        assert_eq!(config.max_message_bytes, 65536);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert!(matches!(args.log_format, LogFormat::Text));
    }

    #[test]
    fn test_explicit_args() {
        let args = Args::try_parse_from([
            "hush-relay",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--max-message-bytes",
            "1024",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = RelayConfig::from(&args);

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.max_message_bytes, 1024);
        assert!(matches!(args.log_format, LogFormat::Json));
    }
}
