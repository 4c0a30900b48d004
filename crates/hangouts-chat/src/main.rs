//! hangouts-chat-handler - Sensu Go handler for Google Hangouts Chat.
//!
//! Reads one Sensu event as JSON from stdin, renders it into a chat card and
//! POSTs it to the configured webhook.
//!
//! # Environment Variables
//!
//! - `HANGOUTSCHAT_WEBHOOK` - webhook URL (required, or pass `--webhook`)
//! - `HANGOUTSCHAT_SENSU_DASHBOARD` - dashboard base URL for the source link
//! - `RUST_LOG` - log filter, defaults to `info`
//!
//! # Exit status
//!
//! Zero once the event was handled, even if the webhook rejected it. Nonzero
//! on configuration errors or a malformed event.
//!
//! # Examples
//!
//! ```bash
//! cat sensu-event.json | hangouts-chat-handler \
//!     --webhook "https://chat.googleapis.com/v1/spaces/AAAA/messages?key=k&token=t" \
//!     --withAnnotations --annotations-suffix-link _url --threadKey
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use hangouts_chat::{Event, Handler, HandlerConfig};
use std::io::Read;
use tracing_subscriber::EnvFilter;

/// Post Sensu events to Google Hangouts Chat.
#[derive(Parser)]
#[command(name = "hangouts-chat-handler")]
#[command(about = "The Sensu Go Google Hangouts Chat handler for alerting")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    config: HandlerConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read event from stdin")?;
    let event = Event::from_json(&input).context("Failed to parse event")?;

    let handler = Handler::new(cli.config).context("Failed to create Hangouts Chat channel")?;
    let outcome = handler.handle(&event).await?;

    tracing::debug!(outcome = ?outcome, "Done");
    Ok(())
}
