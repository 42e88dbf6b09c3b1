//! xledger CLI: quote and send payments across ledgers.
//!
//! Subcommands: init, quote, send.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{LoggingConfig, XledgerConfig};

/// xledger: escrowed payments across a chain of ledgers.
#[derive(Parser, Debug)]
#[command(name = "xledger", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "xledger.toml", global = true)]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Ask a connector for a quote and print the quoted path.
    Quote(commands::quote::QuoteArgs),
    /// Execute a payment.
    Send(commands::send::SendArgs),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init(args) = &cli.command {
        return commands::init::run(args, &cli.config);
    }

    let mut config = XledgerConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging);

    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Quote(args) => commands::quote::run(args, &config).await,
        Commands::Send(args) => commands::send::run(args, &config).await,
    }
}
