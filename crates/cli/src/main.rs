//! Proxydeck CLI - Main Entry Point
//!
//! Manages proxy-bound instances and generates Proxifier profiles
//! from the local instance store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, instance, ppx, Context};
use proxydeck_common::ProxydeckConfig;

/// Proxydeck CLI - instance store and Proxifier profile generator
#[derive(Parser)]
#[command(name = "proxydeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file path
    #[arg(long, env = "PROXYDECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides store_path from the config)
    #[arg(long, env = "PROXYDECK_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage instances
    #[command(subcommand)]
    Instance(instance::InstanceCommands),

    /// Proxifier profile generation
    #[command(subcommand)]
    Ppx(ppx::PpxCommands),

    /// Inspect or create the config file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output; logs go to stderr
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(proxydeck_common::default_config_path);
    let config = ProxydeckConfig::load(&config_path)?;
    let db_path = cli.db.unwrap_or_else(|| config.db_path());

    let ctx = Context {
        config,
        config_path,
        db_path,
        format: cli.format,
    };

    match cli.command {
        Commands::Instance(cmd) => instance::execute(cmd, &ctx)?,
        Commands::Ppx(cmd) => ppx::execute(cmd, &ctx)?,
        Commands::Config(cmd) => config::execute(cmd, &ctx)?,
        Commands::Version => {
            println!("Proxydeck CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("common v{}", proxydeck_common::VERSION);
        }
    }

    Ok(())
}
