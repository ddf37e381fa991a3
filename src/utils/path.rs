//! Path handling shared by config loading, the watcher and `check`.
//!
//! Every path that reaches the rule matcher is absolute and canonical where
//! the file exists, so rule `scope_root`s and watcher events compare equal.

use std::path::{Path, PathBuf};

/// Absolute form of `path`.
///
/// Canonical when the path exists (symlinks resolved). A missing path is
/// kept lexically, joined onto the current directory if relative.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve a path typed on the command line.
///
/// Existing cwd-relative paths win; anything else is taken relative to
/// `fallback_dir` (the default rule scope root), so both
/// `public/css/site.css` and `css/site.css` work from the project root.
pub fn resolve_path(path: &Path, fallback_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path.exists() {
        normalize_path(path)
    } else {
        normalize_path(&fallback_dir.join(path))
    }
}

/// Expand `~` and resolve a config path against the config directory.
///
/// The current directory is never consulted.
pub fn expand_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    normalize_path(&base.join(expanded))
}
