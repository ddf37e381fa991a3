//! Check report formatting.

use std::fmt;
use std::path::PathBuf;

use owo_colors::{OwoColorize, Stream::Stdout};

use crate::reload::matcher::{RuleId, RuleSet};

/// What happens to a change at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Dropped by `watch.ignored` before matching
    Ignored,
    /// Rules that fire, in declaration order (may be empty)
    Matched(Vec<RuleId>),
}

#[derive(Debug)]
struct RuleLine {
    id: RuleId,
    reaction: String,
    patterns: Vec<String>,
    scope_root: PathBuf,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    rules: Vec<RuleLine>,
    paths: Vec<(PathBuf, PathOutcome)>,
}

impl CheckReport {
    pub fn from_rules(rules: &RuleSet) -> Self {
        let rules = rules
            .iter()
            .map(|rule| RuleLine {
                id: rule.id,
                reaction: rule.reaction.label().to_string(),
                patterns: rule.patterns.clone(),
                scope_root: rule.scope_root.clone(),
            })
            .collect();
        Self {
            rules,
            paths: Vec::new(),
        }
    }

    pub fn add_path(&mut self, path: PathBuf, outcome: PathOutcome) {
        self.paths.push((path, outcome));
    }

    fn reaction_of(&self, id: RuleId) -> &str {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .map_or("reload", |r| r.reaction.as_str())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "rules:".if_supports_color(Stdout, |t| t.bold()))?;
        for rule in &self.rules {
            writeln!(
                f,
                "  {} {} [{}] in {}",
                rule.id.if_supports_color(Stdout, |t| t.cyan()),
                rule.reaction.if_supports_color(Stdout, |t| t.green()),
                rule.patterns.join(", "),
                rule.scope_root.display().if_supports_color(Stdout, |t| t.dimmed())
            )?;
        }

        if self.paths.is_empty() {
            return Ok(());
        }

        writeln!(f, "{}", "paths:".if_supports_color(Stdout, |t| t.bold()))?;
        for (path, outcome) in &self.paths {
            write!(f, "  {} ", path.display())?;
            match outcome {
                PathOutcome::Ignored => {
                    writeln!(f, "{}", "ignored".if_supports_color(Stdout, |t| t.yellow()))?
                }
                PathOutcome::Matched(ids) if ids.is_empty() => {
                    writeln!(f, "{}", "no rule".if_supports_color(Stdout, |t| t.dimmed()))?
                }
                PathOutcome::Matched(ids) => {
                    let fired: Vec<String> = ids
                        .iter()
                        .map(|id| format!("{} ({})", id, self.reaction_of(*id)))
                        .collect();
                    writeln!(f, "-> {}", fired.join(", "))?
                }
            }
        }
        Ok(())
    }
}
