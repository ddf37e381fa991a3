//! Configuration management for `livesync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── serve      # [serve]
//! │   ├── watch      # [watch]
//! │   ├── client     # [client]
//! │   ├── log        # [log]
//! │   └── rule       # [[rules]]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # SyncConfig (this file)
//! ```
//!
//! The file is read once. After [`SyncConfig::load`] returns, the value is
//! wrapped in an `Arc` and handed to every component that needs it.

pub mod section;
pub mod types;
mod util;

pub use section::{ClientConfig, LogConfig, RuleConfig, ServeConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use crate::{
    actor::Heartbeat,
    cli::{Cli, Commands, ServeArgs},
    log,
    reload::{ignore::IgnoreSet, matcher::RuleSet, scheduler::Windows},
    utils::path::{expand_path, normalize_path},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livesync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Proxy and WebSocket endpoint settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// File watching and timing
    #[serde(default)]
    pub watch: WatchConfig,

    /// Client heartbeat settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,

    /// Reload rules, in evaluation order
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl SyncConfig {
    /// Load configuration for a non-init command.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory. Command-line overrides are applied
    /// before validation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = find_config_file(&cli.config).with_context(|| {
            format!(
                "Config file '{}' not found. Run 'livesync init' to create one.",
                cli.config.display()
            )
        })?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize();
        if let Commands::Serve { args } = &cli.command {
            config.apply_serve_args(args);
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve paths against the config directory.
    fn finalize(&mut self) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = normalize_path(&root);
        self.normalize_paths();
    }

    /// Normalize watch roots and rule scope roots relative to `root`.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.watch.roots = self
            .watch
            .roots
            .iter()
            .map(|p| expand_path(p, &root))
            .collect();
        for rule in &mut self.rules {
            if let Some(scope_root) = rule.scope_root.take() {
                rule.scope_root = Some(expand_path(&scope_root, &root));
            }
        }
    }

    /// Apply `serve` command-line overrides.
    pub fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.ws_port, args.ws_port.as_ref());
        Self::update_option(&mut self.serve.proxy, args.proxy.as_ref());
        if args.verbose {
            self.log.level = crate::logger::LogLevel::Debug;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Directory rule patterns are relative to when no `scope_root` is set.
    pub fn default_scope_root(&self) -> &Path {
        self.watch
            .roots
            .first()
            .map_or(self.root.as_path(), PathBuf::as_path)
    }

    // ========================================================================
    // derived runtime values
    // ========================================================================

    /// Compile `[[rules]]` into an immutable rule set.
    pub fn compile_rules(&self) -> Result<RuleSet, ConfigError> {
        let default_root = self.default_scope_root();
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.compile(i, default_root))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(rules))
    }

    pub fn ignore_set(&self) -> Result<IgnoreSet, ConfigError> {
        Ok(IgnoreSet::new(&self.watch.ignored, self.watch.roots.clone())?)
    }

    pub fn windows(&self) -> Windows {
        self.watch.windows()
    }

    pub fn heartbeat(&self) -> Heartbeat {
        self.client.heartbeat()
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.client.validate(&mut diag);
        for (i, rule) in self.rules.iter().enumerate() {
            rule.validate(i, &mut diag);
        }
        if self.rules.is_empty() {
            diag.warn(
                FieldPath::new("rules"),
                "no rules configured, file changes will never reload",
            );
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)?;

        // Patterns that passed the cheap checks must also compile
        self.compile_rules()?;
        self.ignore_set()?;
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SyncConfig {
    let (parsed, ignored) = SyncConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
