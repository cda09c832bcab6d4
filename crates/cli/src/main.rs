//! cartsync CLI - Drive cart sessions against the backend from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Start a guest session
//! cartsync session new
//!
//! # Add an item to a guest cart
//! cartsync cart add --unique-id <ID> --item-code IM31790673 --qty 1 --new-price 20
//!
//! # Show the cart
//! cartsync cart list --unique-id <ID>
//!
//! # Change a line's quantity, then remove it
//! cartsync cart update --cart-id 28447 --qty 2
//! cartsync cart delete --cart-id 28447
//!
//! # Run add -> list -> update -> delete against a fresh guest session
//! cartsync cart smoke --item-code IM31790673 --new-price 20
//!
//! # Log backend reachability changes for a minute
//! cartsync watch --seconds 60
//! ```
//!
//! Configuration comes from `CARTSYNC_*` environment variables (or `.env`).
//! Set `CARTSYNC_LOG_JSON=1` for JSON log lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartsync_client::{CartError, ConfigError};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::CartCommand;

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "cartsync cart session tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage guest sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Add, list, update and delete cart lines
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Log backend reachability changes
    Watch {
        /// Stop after this many seconds (default: until Ctrl+C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print a fresh anonymous session token
    New,
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("smoke test failed at {step}: {reason}")]
    Smoke { step: &'static str, reason: String },

    #[error("failed to build reachability probe: {0}")]
    Probe(String),
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync_cli=info,cartsync_client=info".into());
    // CARTSYNC_LOG_JSON=1 switches to one JSON object per event
    let json_logs = std::env::var("CARTSYNC_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let json_layer = json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if let CliError::Cart(cart_err) = &e {
            tracing::error!("{}", cart_err.user_message());
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Session { action } => match action {
            SessionAction::New => commands::session::new_session(),
        },
        Commands::Cart { action } => commands::cart::run(action).await?,
        Commands::Watch { seconds } => commands::watch::run(seconds).await?,
    }
    Ok(())
}
