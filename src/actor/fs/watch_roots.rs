use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps every configured root attached to the watcher.
///
/// Roots that do not exist yet (or were deleted and recreated) are attached
/// on the next `maintain` pass.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing<W: Watcher>(&mut self, watcher: &mut W) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                crate::log!("watch"; "root not found yet: {}", path.display());
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
            crate::debug!("watch"; "watching {}", path.display());
        }
        Ok(())
    }

    /// Re-attach roots that reappeared. Returns how many were attached.
    pub(super) fn maintain<W: Watcher>(&mut self, watcher: &mut W) -> usize {
        self.attached.retain(|path| path.exists());

        let mut reattached = 0;
        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                reattached += 1;
                crate::debug!("watch"; "re-attached watch: {}", path.display());
            }
        }
        reattached
    }

    #[cfg(test)]
    pub(super) fn is_attached(&self, path: &Path) -> bool {
        self.attached.contains(path)
    }

    #[cfg(test)]
    pub(super) fn attached_count(&self) -> usize {
        self.attached.len()
    }
}
