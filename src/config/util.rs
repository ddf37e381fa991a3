//! Config file discovery.

use std::path::{Path, PathBuf};

/// Locate `config_name`, searching from the current directory upward.
///
/// An absolute name is only checked as given. This lets `livesync serve`
/// run from any subdirectory of the project:
///
/// ```text
/// /home/user/app/templates/pages/   <- cwd
/// /home/user/app/livesync.toml      <- found
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
