//! livesync - live reload coordinator for server-rendered applications.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SyncConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Commands::Init { force } = cli.command {
        return cli::init::init(&cli, force);
    }

    let config = SyncConfig::load(&cli)?;
    config.log.apply();

    match &cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Serve { .. } => cli::serve::serve(Arc::new(config)),
        Commands::Check { paths } => cli::check::check(&config, paths),
    }
}
