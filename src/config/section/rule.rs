//! `[[rules]]` configuration.
//!
//! Each entry binds path patterns to a reaction. Entries are evaluated in
//! file order and every matching entry fires.
//!
//! ```toml
//! [[rules]]
//! patterns = ["public/css/styles.css"]
//! reaction = { kind = "scoped", scope = "*.css" }
//!
//! [[rules]]
//! patterns = ["templates/**/*.gohtml", "public/js/*.js"]
//! # scope_root = "."          # defaults to the first watch root
//! # reaction = { kind = "notify", message = "templates changed" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::reload::error::MatchError;
use crate::reload::matcher::{MatchRule, RuleId};
use crate::reload::reaction::{Announce, ReactionKind, ScopedReload};

/// Reaction selected by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReactionConfig {
    /// Full page reload.
    #[default]
    Reload,
    /// Refresh resources matching `scope` only.
    Scoped { scope: String },
    /// Emit `message`, then reload (scoped when `scope` is set).
    Notify {
        message: String,
        #[serde(default)]
        scope: Option<String>,
    },
}

impl ReactionConfig {
    pub fn to_kind(&self) -> ReactionKind {
        match self {
            Self::Reload => ReactionKind::Default,
            Self::Scoped { scope } => ReactionKind::custom(ScopedReload {
                scope: scope.clone(),
            }),
            Self::Notify { message, scope } => ReactionKind::custom(Announce {
                message: message.clone(),
                scope: scope.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    pub patterns: Vec<String>,

    /// Directory patterns are relative to. Resolved against the config directory.
    #[serde(default)]
    pub scope_root: Option<PathBuf>,

    #[serde(default)]
    pub reaction: ReactionConfig,
}

impl RuleConfig {
    /// Compile into a matcher rule. `default_root` is used when no
    /// `scope_root` is configured.
    pub fn compile(&self, index: usize, default_root: &Path) -> Result<MatchRule, MatchError> {
        let root = self
            .scope_root
            .clone()
            .unwrap_or_else(|| default_root.to_path_buf());
        MatchRule::new(
            RuleId(index),
            self.patterns.clone(),
            root,
            self.reaction.to_kind(),
        )
    }

    pub fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        if self.patterns.is_empty() {
            diag.error_with_hint(
                FieldPath::new("rules.patterns"),
                format!("rule #{index} has no patterns"),
                "patterns = [\"public/**/*.css\"]",
            );
        }
        if self.patterns.iter().any(|p| Path::new(p).is_absolute()) {
            diag.error_with_hint(
                FieldPath::new("rules.patterns"),
                format!("rule #{index} uses an absolute pattern"),
                "patterns are relative to scope_root",
            );
        }
        match &self.reaction {
            ReactionConfig::Scoped { scope } if scope.trim().is_empty() => diag.error(
                FieldPath::new("rules.reaction.scope"),
                format!("rule #{index}: scoped reaction needs a non-empty scope"),
            ),
            ReactionConfig::Notify { message, .. } if message.trim().is_empty() => diag.error(
                FieldPath::new("rules.reaction.message"),
                format!("rule #{index}: notify reaction needs a message"),
            ),
            _ => {}
        }
    }
}
