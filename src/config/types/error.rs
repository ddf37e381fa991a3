//! Configuration error types.

use super::FieldPath;
use owo_colors::{OwoColorize, Stream::Stderr};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::reload::error::MatchError;

/// Startup failures while loading `livesync.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern in config")]
    Rules(#[from] MatchError),

    // No #[from]: a source() here would print the diagnostics twice
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// How a diagnostic affects startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Startup is refused.
    Error,
    /// Reported once, startup continues.
    Warning,
}

/// One finding about one config field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}{}{}",
            "[".if_supports_color(Stderr, |t| t.dimmed()),
            self.field.as_str().if_supports_color(Stderr, |t| t.cyan()),
            "]".if_supports_color(Stderr, |t| t.dimmed())
        )?;
        write!(f, "{} {}", "→".if_supports_color(Stderr, |t| t.red()), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  {} {}", "hint:".if_supports_color(Stderr, |t| t.yellow()), hint)?;
        }
        Ok(())
    }
}

/// Every finding of one validation pass.
///
/// Sections push into it; [`into_result`](Self::into_result) decides whether
/// startup continues.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    entries: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        severity: Severity,
        field: FieldPath,
        message: String,
        hint: Option<String>,
    ) {
        self.entries.push(ConfigDiagnostic {
            severity,
            field,
            message,
            hint,
        });
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(Severity::Error, field, message.into(), Some(hint.into()));
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Warning, field, message.into(), None);
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.entries.iter().filter(move |d| d.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.with_severity(Severity::Warning)
    }

    /// Number of errors. Warnings are not counted.
    pub fn len(&self) -> usize {
        self.errors().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Print warnings grouped under one header.
    pub fn print_warnings(&self) {
        let mut warnings = self.warnings().peekable();
        if warnings.peek().is_none() {
            return;
        }
        crate::log!("warning"; "config accepted with warnings:");
        for warning in warnings {
            eprintln!("- {}: {}", warning.field.as_str(), warning.message);
        }
    }

    /// `Err(self)` when at least one error was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = "config validation failed:";
        writeln!(
            f,
            "{}\n",
            header.if_supports_color(Stderr, |t| t.style(owo_colors::Style::new().red().bold()))
        )?;
        let count = self.len();
        for (i, err) in self.errors().enumerate() {
            write!(f, "{err}")?;
            if i + 1 < count {
                writeln!(f, "\n")?;
            }
        }
        if count > 1 {
            write!(
                f,
                "\n\n{} {} {}",
                "found".if_supports_color(Stderr, |t| t.dimmed()),
                count.if_supports_color(Stderr, |t| t.style(owo_colors::Style::new().red().bold())),
                "errors".if_supports_color(Stderr, |t| t.dimmed())
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
