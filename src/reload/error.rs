//! Error taxonomy of the reload pipeline.
//!
//! | Error             | Raised by            | Fatal? | Handling                          |
//! |-------------------|----------------------|--------|-----------------------------------|
//! | `MatchError`      | rule/ignore compile  | yes    | refuse to start                   |
//! | `ReactionError`   | reaction executor    | no     | log, fall back to full reload     |
//! | `DeliveryError`   | broadcast dispatcher | no     | drop the client                   |
//! | `WatcherGapError` | watcher adapter      | no     | re-arm pending rules, diagnostic  |

use std::path::PathBuf;

use thiserror::Error;

/// Invalid rule or ignore configuration. Always a startup failure.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("rule #{rule}: invalid pattern `{pattern}`")]
    InvalidPattern {
        rule: usize,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("rule #{0} has no patterns")]
    EmptyRule(usize),

    #[error("invalid ignore pattern `{pattern}`")]
    InvalidIgnore {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("rule #{rule}: scope root `{}` is not absolute", root.display())]
    RelativeScope { rule: usize, root: PathBuf },
}

/// A custom reaction failed. The executor recovers with a full reload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReactionError {
    #[error("reaction `{reaction}` failed: {message}")]
    Failed { reaction: String, message: String },

    #[error("reaction `{reaction}` panicked: {message}")]
    Panicked { reaction: String, message: String },
}

impl ReactionError {
    /// Convenience constructor for reaction implementations.
    #[cfg(test)]
    pub fn failed(reaction: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            reaction: reaction.into(),
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn reaction(&self) -> &str {
        match self {
            Self::Failed { reaction, .. } | Self::Panicked { reaction, .. } => reaction,
        }
    }
}

/// Delivering a message to one client failed. Never affects other clients.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The handle was unregistered before delivery.
    #[error("client already closed")]
    Closed,

    /// The connection thread is gone (socket closed without notice).
    #[error("client connection lost")]
    Disconnected,

    /// The client stopped draining its outbox.
    #[error("client outbox full")]
    Saturated,
}

/// The watcher reported that events may have been lost.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WatcherGapError {
    #[error("watcher queue overflowed, events were dropped")]
    Overflow,

    #[error("watcher backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_error_display() {
        let source = globset::Glob::new("a[").unwrap_err();
        let err = MatchError::InvalidPattern {
            rule: 2,
            pattern: "a[".into(),
            source,
        };
        let display = err.to_string();
        assert!(display.contains("rule #2"));
        assert!(display.contains("`a[`"));

        assert_eq!(
            MatchError::EmptyRule(0).to_string(),
            "rule #0 has no patterns"
        );
    }

    #[test]
    fn test_reaction_error_accessors() {
        let err = ReactionError::failed("css", "boom");
        assert_eq!(err.reaction(), "css");
        assert_eq!(err.to_string(), "reaction `css` failed: boom");
    }
}
