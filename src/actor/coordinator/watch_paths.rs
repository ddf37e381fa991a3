use std::path::PathBuf;

use crate::config::SyncConfig;

/// Watch roots from `[watch]`, without duplicates.
///
/// Watches are recursive, so a root nested in another root is redundant and
/// would report every event twice.
pub(super) fn collect_watch_roots(config: &SyncConfig) -> Vec<PathBuf> {
    let mut roots = config.watch.roots.clone();
    roots.sort();
    roots.dedup();
    dedupe_nested_roots(&mut roots);
    roots
}

/// Drop every root that lives under another root.
fn dedupe_nested_roots(roots: &mut Vec<PathBuf>) {
    let all = roots.clone();
    roots.retain(|root| {
        !all.iter()
            .any(|other| other != root && root.starts_with(other))
    });
}
