//! notify events -> change records.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use rustc_hash::FxHashSet;

use crate::actor::messages::WatchMsg;
use crate::reload::error::WatcherGapError;
use crate::reload::ignore::IgnoreSet;
use crate::reload::record::{ChangeKind, ChangeRecord};
use crate::utils::path::normalize_path;

/// Converts raw notify results into `WatchMsg`s.
///
/// Applies, in order: kind mapping, editor temp-file filter, `watch.ignored`,
/// and the `watch.events` filter.
pub(super) struct EventAdapter {
    ignore: Arc<IgnoreSet>,
    events: FxHashSet<ChangeKind>,
}

impl EventAdapter {
    pub(super) fn new(ignore: Arc<IgnoreSet>, events: &[ChangeKind]) -> Self {
        Self {
            ignore,
            events: events.iter().copied().collect(),
        }
    }

    pub(super) fn adapt(&self, result: notify::Result<notify::Event>) -> Vec<WatchMsg> {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                return vec![WatchMsg::Gap(WatcherGapError::Backend(e.to_string()))];
            }
        };

        if event.need_rescan() {
            return vec![WatchMsg::Gap(WatcherGapError::Overflow)];
        }

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let observed_at = Instant::now();
        classify(&event)
            .into_iter()
            .filter(|(path, _)| !is_temp_file(path))
            .map(|(path, kind)| (normalize_path(path), kind))
            .filter(|(path, kind)| self.events.contains(kind) && !self.ignore.is_ignored(path))
            .map(|(path, kind)| WatchMsg::Record(ChangeRecord::new(path, kind, observed_at)))
            .collect()
    }
}

/// Map one notify event to `(path, kind)` pairs.
fn classify(event: &notify::Event) -> Vec<(&Path, ChangeKind)> {
    let paths = event.paths.iter().map(|p| p.as_path());

    match event.kind {
        EventKind::Create(CreateKind::Folder) => {
            paths.map(|p| (p, ChangeKind::DirCreated)).collect()
        }
        EventKind::Create(CreateKind::File) => paths.map(|p| (p, ChangeKind::Created)).collect(),
        EventKind::Create(_) => paths
            .map(|p| {
                let kind = if p.is_dir() {
                    ChangeKind::DirCreated
                } else {
                    ChangeKind::Created
                };
                (p, kind)
            })
            .collect(),

        EventKind::Remove(RemoveKind::Folder) => {
            paths.map(|p| (p, ChangeKind::DirRemoved)).collect()
        }
        EventKind::Remove(_) => paths.map(|p| (p, ChangeKind::Removed)).collect(),

        // mtime/atime/chmod noise
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.map(|p| (p, ChangeKind::Removed)).collect(),
            RenameMode::To => paths.map(|p| (p, created_kind(p))).collect(),
            RenameMode::Both => {
                let mut out = Vec::with_capacity(2);
                if let Some(from) = event.paths.first() {
                    out.push((from.as_path(), ChangeKind::Removed));
                }
                if let Some(to) = event.paths.get(1) {
                    out.push((to.as_path(), created_kind(to)));
                }
                out
            }
            // Backend cannot tell which side this is: whatever exists now was created
            _ => paths
                .map(|p| {
                    let kind = if p.exists() {
                        created_kind(p)
                    } else {
                        ChangeKind::Removed
                    };
                    (p, kind)
                })
                .collect(),
        },

        EventKind::Modify(_) => paths
            .filter(|p| !p.is_dir())
            .map(|p| (p, ChangeKind::Modified))
            .collect(),

        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn created_kind(path: &Path) -> ChangeKind {
    if path.is_dir() {
        ChangeKind::DirCreated
    } else {
        ChangeKind::Created
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
