//! Groundwire CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive chat; the CLI keeps the history
//! - `ask`: Single question, no history
//! - `serve`: Start the HTTP gateway
//! - `init-index`: Probe the encoder and make sure the index exists
//! - `doctor`: Diagnose configuration and service reachability
//! - `config`: Print the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "groundwire",
    about = "Groundwire — retrieval-augmented chat over your own index",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.groundwire/config.toml)
    #[arg(long, global = true, env = "GROUNDWIRE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively
    Chat,

    /// Ask a single question
    Ask {
        /// The question
        #[arg(short, long)]
        message: String,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Probe the encoder and create the index if it is missing
    InitIndex,

    /// Diagnose configuration and service health
    Doctor,

    /// Print the effective configuration (secrets redacted)
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Chat => commands::chat::run(config_path).await?,
        Commands::Ask { message } => commands::ask::run(config_path, message).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::InitIndex => commands::init_index::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config { default } => commands::config_cmd::run(config_path, default)?,
    }

    Ok(())
}
