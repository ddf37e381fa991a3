//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, shown only at the debug level
//! - `WatchStatus` for the single-line "reloaded" status in serve mode
//!
//! # Example
//!
//! ```ignore
//! log!("watch"; "watching {} roots", count);
//! debug!("scheduler"; "rule {} pending", id);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream::Stdout};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicU8, Ordering},
};

/// Output verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Nothing but fatal errors
    Silent = 0,
    #[default]
    Info = 1,
    Debug = 2,
}

impl LogLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Silent,
            1 => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Global level (set from `[log]` or `--verbose`)
static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Global line prefix (set from `log.prefix`)
static PREFIX: RwLock<String> = parking_lot::const_rwlock(String::new());

pub fn set_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn level() -> LogLevel {
    LogLevel::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Check if debug output is enabled
pub fn is_verbose() -> bool {
    level() >= LogLevel::Debug
}

pub fn set_prefix(prefix: &str) {
    *PREFIX.write() = prefix.to_string();
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::level() >= $crate::logger::LogLevel::Info {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Log a debug message (only shown at the debug level)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let line = format_line(module, message);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{line}").ok();
    stdout.flush().ok();
}

fn format_line(module: &str, message: &str) -> String {
    let module_prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let global = PREFIX.read();
    if global.is_empty() {
        format!("{module_prefix} {message}")
    } else {
        let global = paint(&format!("[{global}]"), |t| t.dimmed().to_string());
        format!("{global} {module_prefix} {message}")
    }
}

/// Style `text` for stdout, honoring `--color` and TTY detection.
fn paint(text: &str, style: impl Fn(&str) -> String) -> String {
    text.if_supports_color(Stdout, |t| style(t)).to_string()
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" | "proxy" => paint(&prefix, |t| t.bright_blue().bold().to_string()),
        "watch" => paint(&prefix, |t| t.bright_green().bold().to_string()),
        "error" => paint(&prefix, |t| t.bright_red().bold().to_string()),
        _ => paint(&prefix, |t| t.bright_yellow().bold().to_string()),
    }
}

// ============================================================================
// Watch Status (single-line status with overwrite)
// ============================================================================

/// Get current time formatted as HH:MM:SS (UTC)
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Single-line status display for serve mode
///
/// Each message overwrites the previous one, keeping the terminal clean
/// while files keep changing.
///
/// # Example
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("reloaded: 2 clients");
/// status.error("reaction failed", "styles: no stylesheet");
/// ```
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

/// Global watch status display shared across actors.
static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(paint("✓", |t| t.green().to_string()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        self.display(paint("✗", |t| t.red().to_string()), &join_detail(summary, detail));
    }

    /// Display warning message (⚠ prefix, yellow).
    pub fn warning(&mut self, detail: &str) {
        self.display(paint("⚠", |t| t.yellow().to_string()), detail);
    }

    fn display(&mut self, symbol: String, message: &str) {
        if level() == LogLevel::Silent {
            return;
        }
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = paint(&format!("[{}]", now()), |t| t.dimmed().to_string());
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn join_detail(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

/// Global watch status: warning
pub fn status_warning(detail: &str) {
    WATCH_STATUS.lock().warning(detail);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_status_new() {
        let status = WatchStatus::new();
        assert_eq!(status.last_lines, 0);
    }

    #[test]
    fn test_no_color_override_gives_plain_prefix() {
        owo_colors::set_override(false);
        assert_eq!(colorize_prefix("watch", "watch"), "[watch]");
        assert_eq!(paint("✓", |t| t.green().to_string()), "✓");
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count("reloaded: 2 clients"), 1);
        assert_eq!(
            line_count(&join_detail("reaction failed", "styles: boom\n  at rule #0")),
            3
        );
    }

    #[test]
    fn test_join_detail_without_detail() {
        assert_eq!(join_detail("gap", ""), "gap");
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Debug > LogLevel::Info);
        assert!(LogLevel::Info > LogLevel::Silent);
        assert_eq!(LogLevel::from_u8(LogLevel::Silent as u8), LogLevel::Silent);
    }

    #[test]
    fn test_level_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let w: Wrapper = toml::from_str("level = \"silent\"").unwrap();
        assert_eq!(w.level, LogLevel::Silent);
    }
}
