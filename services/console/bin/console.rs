//! Main Entrypoint for the Lumen Console
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment (fail-fast, before any UI).
//! 2. Initializing logging.
//! 3. Constructing the identity client and the auth store.
//! 4. Running the gated app loop, restarting it on the reload path.

use anyhow::Context;
use clap::Parser;
use gemini_live::types::ResponseModality;
use lumen_console::{
    app::{self, Outcome},
    config::Config,
    live::GeminiSessionProvider,
};
use lumen_core::{AuthStore, HttpIdentityClient, IdentityService, StaticIdentityService};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "console", about = "Terminal console for the Gemini Live API")]
struct Args {
    /// Override the Live API model id.
    #[arg(long)]
    model: Option<String>,

    /// Request text responses instead of audio.
    #[arg(long)]
    text_only: bool,

    /// Use the built-in demo identity backend instead of IDENTITY_URL.
    #[arg(long)]
    offline: bool,
}

/// Reads stdin lines on a blocking thread and feeds them to the app loop.
fn spawn_stdin_reader(tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.blocking_send(line.trim_end().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration (fails before any UI renders) ---
    let mut config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let args = Args::parse();
    if let Some(model) = args.model {
        config.model = model;
    }
    if args.text_only {
        config.modality = ResponseModality::Text;
    }

    // --- 3. Construct the auth store ---
    let identity: Arc<dyn IdentityService> = if args.offline {
        info!("Using the offline demo identity backend.");
        Arc::new(StaticIdentityService::demo())
    } else {
        info!(identity_url = %config.identity_url, "Using the HTTP identity backend.");
        Arc::new(HttpIdentityClient::new(config.identity_url.clone()))
    };
    let store = AuthStore::new(identity);
    if let Err(e) = store.restore().await {
        warn!("Session restore failed, starting signed out: {e}");
    }

    let provider = GeminiSessionProvider::new(config.descriptor(), config.session_setup());

    // --- 4. Run the app loop ---
    info!(
        model = %config.model,
        modality = ?config.modality,
        endpoint = %config.descriptor().uri(),
        "Console configured. Starting UI loop..."
    );
    let (line_tx, mut line_rx) = mpsc::channel(32);
    spawn_stdin_reader(line_tx);
    let mut out = std::io::stdout();

    loop {
        let outcome = tokio::select! {
            result = app::run(&store, &provider, &mut line_rx, &mut out) => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal. Shutting down gracefully...");
                break;
            }
        };
        match outcome {
            Outcome::Reload => {
                // The full-reload recovery path: drop all per-iteration
                // state and re-restore the session from the backend.
                info!("Reloading session state after verification.");
                if let Err(e) = store.restore().await {
                    warn!("Session restore failed after reload: {e}");
                }
            }
            Outcome::Quit => break,
        }
    }

    info!("Console has shut down.");
    Ok(())
}
