//! Reactions and the reaction executor.
//!
//! A rule either uses the default reaction (full page reload) or carries a
//! custom one implementing [`Reaction`]. The executor is the failure
//! boundary: a custom reaction that errors or panics is logged as a
//! [`ReactionError`] and replaced by a full reload, so a faulty rule never
//! suppresses updates.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use super::error::ReactionError;
use super::matcher::{RuleId, RuleSet};
use super::message::DispatchCommand;

// =============================================================================
// Reaction trait
// =============================================================================

/// Custom behaviour attached to a rule.
pub trait Reaction: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Decide what to dispatch for the given affected paths.
    fn react(
        &self,
        paths: &[PathBuf],
        notifier: &Notifier,
    ) -> Result<DispatchCommand, ReactionError>;
}

/// Reaction attached to a rule.
#[derive(Clone, Default)]
pub enum ReactionKind {
    /// Full page reload.
    #[default]
    Default,
    Custom(Arc<dyn Reaction>),
}

impl ReactionKind {
    pub fn custom(reaction: impl Reaction + 'static) -> Self {
        Self::Custom(Arc::new(reaction))
    }

    /// Wrap a closure as a custom reaction.
    #[cfg(test)]
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[PathBuf], &Notifier) -> Result<DispatchCommand, ReactionError>
            + Send
            + Sync
            + 'static,
    {
        Self::custom(FnReaction {
            name: name.into(),
            f,
        })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Default => "reload",
            Self::Custom(reaction) => reaction.name(),
        }
    }
}

impl fmt::Debug for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Custom(reaction) => write!(f, "Custom({})", reaction.name()),
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Fire-and-forget side channel for reaction notices.
///
/// Sending never blocks; a closed receiver is ignored.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<UnboundedSender<String>>,
}

impl Notifier {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Notifier that only logs.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        crate::log!("notify"; "{}", message);
        if let Some(tx) = &self.tx {
            let _ = tx.send(message);
        }
    }
}

// =============================================================================
// Built-in reactions
// =============================================================================

/// Refresh only resources matching `scope` (e.g. `*.css`).
pub struct ScopedReload {
    pub scope: String,
}

impl Reaction for ScopedReload {
    fn name(&self) -> &str {
        "scoped"
    }

    fn react(&self, _: &[PathBuf], _: &Notifier) -> Result<DispatchCommand, ReactionError> {
        Ok(DispatchCommand::scoped(self.scope.clone()))
    }
}

/// Emit a notice, then reload (scoped when a scope is set).
pub struct Announce {
    pub message: String,
    pub scope: Option<String>,
}

impl Reaction for Announce {
    fn name(&self) -> &str {
        "notify"
    }

    fn react(
        &self,
        paths: &[PathBuf],
        notifier: &Notifier,
    ) -> Result<DispatchCommand, ReactionError> {
        let count = paths.len();
        notifier.notify(format!(
            "{} ({} file{})",
            self.message,
            count,
            if count == 1 { "" } else { "s" }
        ));
        Ok(match &self.scope {
            Some(scope) => DispatchCommand::scoped(scope.clone()),
            None => DispatchCommand::full_reload(),
        })
    }
}

/// Closure-backed reaction.
#[cfg(test)]
pub struct FnReaction<F> {
    name: String,
    f: F,
}

#[cfg(test)]
impl<F> Reaction for FnReaction<F>
where
    F: Fn(&[PathBuf], &Notifier) -> Result<DispatchCommand, ReactionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn react(
        &self,
        paths: &[PathBuf],
        notifier: &Notifier,
    ) -> Result<DispatchCommand, ReactionError> {
        (self.f)(paths, notifier)
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Result of running a rule's reaction.
#[derive(Debug)]
pub struct Execution {
    pub command: DispatchCommand,
    /// Set when a custom reaction failed and the full reload fallback was used.
    pub error: Option<ReactionError>,
}

/// Runs reactions and turns them into dispatch commands.
pub struct ReactionExecutor {
    rules: Arc<RuleSet>,
    notifier: Notifier,
}

impl ReactionExecutor {
    pub fn new(rules: Arc<RuleSet>, notifier: Notifier) -> Self {
        Self { rules, notifier }
    }

    /// Execute the reaction of `rule_id` for the affected paths.
    pub fn execute(&self, rule_id: RuleId, paths: &[PathBuf]) -> Execution {
        let Some(rule) = self.rules.get(rule_id) else {
            crate::debug!("reaction"; "unknown rule {}, full reload", rule_id);
            return Execution {
                command: DispatchCommand::full_reload(),
                error: None,
            };
        };

        let reaction = match &rule.reaction {
            ReactionKind::Default => {
                return Execution {
                    command: DispatchCommand::full_reload(),
                    error: None,
                };
            }
            ReactionKind::Custom(reaction) => reaction,
        };

        match run_guarded(reaction.as_ref(), paths, &self.notifier) {
            Ok(command) => Execution {
                command,
                error: None,
            },
            Err(error) => {
                crate::log!("error"; "rule {}: {}, falling back to full reload", rule_id, error);
                Execution {
                    command: DispatchCommand::full_reload(),
                    error: Some(error),
                }
            }
        }
    }
}

/// Invoke a reaction, turning panics into `ReactionError::Panicked`.
fn run_guarded(
    reaction: &dyn Reaction,
    paths: &[PathBuf],
    notifier: &Notifier,
) -> Result<DispatchCommand, ReactionError> {
    match catch_unwind(AssertUnwindSafe(|| reaction.react(paths, notifier))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ReactionError::Panicked {
                reaction: reaction.name().to_string(),
                message,
            })
        }
    }
}
