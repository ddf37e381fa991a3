//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Live reload coordinator for server-rendered applications
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: livesync.toml)
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = "livesync.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a starter config to the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Proxy the backend and push reloads to connected browsers
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Validate the config and show which rules match the given paths
    #[command(visible_alias = "c")]
    Check {
        /// Paths to test against the rules (relative to the current directory)
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },
}

/// Serve command arguments. Each one overrides the matching `[serve]` field.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Proxy front-end port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Live reload WebSocket port
    #[arg(short = 'w', long = "ws-port")]
    pub ws_port: Option<u16>,

    /// Backend address (e.g., localhost:8080)
    #[arg(long, value_hint = clap::ValueHint::Url)]
    pub proxy: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
