//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! roots = ["."]                        # Directories to watch (relative to config)
//! ignored = ["node_modules", "tmp"]    # Never reported
//! events = ["change", "add", "unlink", "addDir", "unlinkDir"]
//! reload_delay = 100                   # ms, minimum wait after the first event
//! reload_debounce = 250                # ms, quiet period after the last event
//! # max_wait = 1000                    # ms, upper bound on any wait
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::reload::record::ChangeKind;
use crate::reload::scheduler::Windows;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Watch roots. Relative entries are resolved against the config directory.
    pub roots: Vec<PathBuf>,

    /// Ignore patterns (bare names match at any depth).
    pub ignored: Vec<String>,

    /// Which change kinds are reported.
    pub events: Vec<ChangeKind>,

    /// Delay window in milliseconds.
    pub reload_delay: u64,

    /// Debounce window in milliseconds.
    pub reload_debounce: u64,

    /// Starvation ceiling in milliseconds (default: 4 × reload_debounce).
    pub max_wait: Option<u64>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            ignored: vec!["node_modules".into(), "tmp".into()],
            events: ChangeKind::ALL.to_vec(),
            reload_delay: 100,
            reload_debounce: 250,
            max_wait: None,
        }
    }
}

impl WatchConfig {
    pub fn windows(&self) -> Windows {
        let windows = Windows::new(
            Duration::from_millis(self.reload_delay),
            Duration::from_millis(self.reload_debounce),
        );
        match self.max_wait {
            Some(ms) => windows.with_max_wait(Duration::from_millis(ms)),
            None => windows,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.roots.is_empty() {
            diag.error_with_hint(
                FieldPath::new("watch.roots"),
                "no watch roots configured",
                "roots = [\".\"]",
            );
        }

        if self.events.is_empty() {
            diag.error_with_hint(
                FieldPath::new("watch.events"),
                "no change events enabled, nothing would ever reload",
                "events = [\"change\", \"add\", \"unlink\"]",
            );
        }

        if let Some(max_wait) = self.max_wait
            && max_wait < self.reload_delay
        {
            diag.error(
                FieldPath::new("watch.max_wait"),
                format!(
                    "max_wait ({max_wait} ms) is shorter than reload_delay ({} ms)",
                    self.reload_delay
                ),
            );
        }

        if let Some(max_wait) = self.max_wait
            && max_wait < self.reload_debounce
        {
            diag.warn(
                FieldPath::new("watch.max_wait"),
                format!(
                    "max_wait ({max_wait} ms) is shorter than reload_debounce ({} ms), \
                     bursts will not be debounced",
                    self.reload_debounce
                ),
            );
        }

        for root in &self.roots {
            if !root.exists() {
                diag.warn(
                    FieldPath::new("watch.roots"),
                    format!(
                        "{} does not exist yet, it will be watched once created",
                        root.display()
                    ),
                );
            }
        }
    }
}
