//! Ignore patterns for the watcher (`watch.ignored`).
//!
//! A bare name such as `node_modules` ignores that name at any depth, along
//! with everything below it. Anything containing a `/` or glob syntax is
//! matched against the path relative to its watch root.

use std::path::{Path, PathBuf};

use globset::{GlobSet, GlobSetBuilder};

use super::error::MatchError;
use super::matcher::build_glob;

#[derive(Debug)]
pub struct IgnoreSet {
    roots: Vec<PathBuf>,
    globs: GlobSet,
}

impl IgnoreSet {
    pub fn new(patterns: &[String], roots: Vec<PathBuf>) -> Result<Self, MatchError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            for expanded in expand(pattern) {
                let glob = build_glob(&expanded).map_err(|source| MatchError::InvalidIgnore {
                    pattern: pattern.clone(),
                    source,
                })?;
                builder.add(glob);
            }
        }
        let globs = builder.build().map_err(|source| MatchError::InvalidIgnore {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { roots, globs })
    }

    /// Ignore nothing.
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            globs: GlobSet::empty(),
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.globs.is_empty() {
            return false;
        }
        let relative = self
            .roots
            .iter()
            .filter_map(|root| path.strip_prefix(root).ok())
            .min_by_key(|rel| rel.components().count())
            .unwrap_or(path);
        self.globs.is_match(relative)
    }
}

/// A trailing `/` makes the pattern root-relative, so `build/` only
/// ignores `<root>/build` while `build` ignores it at any depth.
fn expand(pattern: &str) -> Vec<String> {
    let is_name = !pattern.contains('/') && !pattern.contains(['*', '?', '[', '{']);
    let pattern = pattern.trim_end_matches('/');
    if is_name {
        vec![format!("**/{pattern}"), format!("**/{pattern}/**")]
    } else {
        vec![pattern.to_string(), format!("{pattern}/**")]
    }
}
