//! Jarvis CLI
//!
//! A thin wrapper around jarvis-core: runs the webhook server or pushes a
//! single message through the pipeline from the command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use jarvis_core::{
    history::MemoryHistoryStore, webhook, Collaborators, Composer, ComposerSettings,
    InboundMessage, JarvisConfig,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "jarvis")]
#[command(about = "Bilingual WhatsApp assistant: weather, Wikipedia, web search and chat")]
struct Args {
    /// Path to a TOML config file (defaults to ./jarvis.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Answer a single message and print the reply
    Ask {
        /// Message text, as a gateway user would send it
        text: String,

        /// Sender id used for conversation history
        #[arg(long = "from", default_value = "cli")]
        from: String,

        /// Only classify the message and print the intent JSON
        #[arg(long)]
        classify: bool,

        /// Keep history in memory instead of the history directory
        #[arg(long = "no-history")]
        no_history: bool,
    },
}

// ============================================================================
// Logging
// ============================================================================

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

async fn run_serve(config: JarvisConfig, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    if config.openai_key.is_none() {
        tracing::warn!("OPENAI_KEY is not set; general chat and web search answers will be unavailable");
    }
    if config.serpapi_key.is_none() {
        tracing::warn!("SERPAPI_KEY is not set; web search is disabled");
    }
    tracing::debug!(history_dir = %config.history_dir.display(), "history storage");

    let composer = Arc::new(Composer::from_config(&config)?);
    webhook::serve(composer, port).await
}

async fn run_ask(config: JarvisConfig, text: &str, from: &str, classify: bool, no_history: bool) -> Result<()> {
    let settings = ComposerSettings::from(&config);
    let mut services = Collaborators::from_config(&config)?;
    if no_history {
        services.history = Arc::new(MemoryHistoryStore::new());
    }
    let composer = Composer::new(services, settings);

    if classify {
        let output = serde_json::json!({
            "language": composer.detect_language(text),
            "intent": composer.classify(text),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let reply = composer.respond(&InboundMessage::new(from, text.trim())).await;
    println!("{}", reply);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);

    let config = JarvisConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Serve { port } => run_serve(config, port).await,
        Command::Ask {
            text,
            from,
            classify,
            no_history,
        } => run_ask(config, &text, &from, classify, no_history).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
