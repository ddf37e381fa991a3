//! Raw change records produced by the watcher adapter.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// What happened to a path.
///
/// The serialized names follow the event names used by browser-sync
/// configurations (`watchEvents`), so existing setups translate 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "add")]
    Created,
    #[serde(rename = "change")]
    Modified,
    #[serde(rename = "unlink")]
    Removed,
    #[serde(rename = "addDir")]
    DirCreated,
    #[serde(rename = "unlinkDir")]
    DirRemoved,
}

impl ChangeKind {
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::Modified,
        Self::Removed,
        Self::DirCreated,
        Self::DirRemoved,
    ];

    /// Directory-level change (only matched by directory patterns).
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::DirCreated | Self::DirRemoved)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::DirCreated => "dir created",
            Self::DirRemoved => "dir removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One filesystem change, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub observed_at: Instant,
}

impl ChangeRecord {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind, observed_at: Instant) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at,
        }
    }

    /// Record observed right now.
    pub fn now(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self::new(path, kind, Instant::now())
    }
}
