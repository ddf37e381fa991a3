//! Project initialization.
//!
//! Writes a starter `livesync.toml` to the current directory.

mod template;

use crate::{cli::Cli, log};
use anyhow::{Context, Result};

/// Write the starter config next to the current directory.
pub fn init(cli: &Cli, force: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let path = cwd.join(&cli.config);

    template::write_config(&path, force)?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}
