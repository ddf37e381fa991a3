//! Config check command.
//!
//! Validates the config, lists the compiled rules and shows which rules
//! (if any) each given path would trigger.

mod report;

use std::path::PathBuf;

use anyhow::Result;

use crate::config::SyncConfig;
use crate::log;
use crate::reload::record::{ChangeKind, ChangeRecord};
use crate::utils::path::resolve_path;
use crate::utils::plural::plural_count;

use report::{CheckReport, PathOutcome};

/// Validate config and test paths against the rules.
pub fn check(config: &SyncConfig, paths: &[PathBuf]) -> Result<()> {
    let rules = config.compile_rules()?;
    let ignore = config.ignore_set()?;

    log!("check"; "config ok: {}, {}",
        plural_count(config.watch.roots.len(), "root"),
        plural_count(rules.len(), "rule"));

    let mut report = CheckReport::from_rules(&rules);
    for path in paths {
        let path = resolve_path(path, config.default_scope_root());
        let kind = if path.is_dir() {
            ChangeKind::DirCreated
        } else {
            ChangeKind::Modified
        };

        let outcome = if ignore.is_ignored(&path) {
            PathOutcome::Ignored
        } else {
            let record = ChangeRecord::now(&path, kind);
            PathOutcome::Matched(rules.matches(&record).iter().map(|r| r.id).collect())
        };
        report.add_path(path, outcome);
    }

    print!("{report}");
    Ok(())
}
