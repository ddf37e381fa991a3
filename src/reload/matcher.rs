//! Rule matching.
//!
//! A [`RuleSet`] is compiled once at startup and never mutated afterwards,
//! so it is shared as `Arc<RuleSet>` without locking.
//!
//! Pattern syntax:
//! - `*` matches inside a single path segment
//! - `**` matches across segments
//! - anything else is literal (case-sensitive)
//! - a trailing `/` marks a directory pattern: it only matches
//!   `DirCreated`/`DirRemoved` records, and file patterns never match them

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use super::error::MatchError;
use super::reaction::ReactionKind;
use super::record::ChangeRecord;

/// Declaration ordinal of a rule. Lower ids were declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compile a single glob with segment-aware `*`.
pub(super) fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
}

/// A path-pattern-to-reaction binding.
pub struct MatchRule {
    pub id: RuleId,
    pub patterns: Vec<String>,
    pub reaction: ReactionKind,
    pub scope_root: PathBuf,
    files: GlobSet,
    dirs: GlobSet,
}

impl MatchRule {
    /// Compile a rule. Fails on an empty or malformed pattern list.
    pub fn new(
        id: RuleId,
        patterns: Vec<String>,
        scope_root: impl Into<PathBuf>,
        reaction: ReactionKind,
    ) -> Result<Self, MatchError> {
        let scope_root = scope_root.into();
        if patterns.is_empty() {
            return Err(MatchError::EmptyRule(id.0));
        }
        if !scope_root.is_absolute() {
            return Err(MatchError::RelativeScope {
                rule: id.0,
                root: scope_root,
            });
        }

        let mut files = GlobSetBuilder::new();
        let mut dirs = GlobSetBuilder::new();
        for pattern in &patterns {
            let (builder, raw) = match pattern.strip_suffix('/') {
                Some(dir) => (&mut dirs, dir),
                None => (&mut files, pattern.as_str()),
            };
            let glob = build_glob(raw).map_err(|source| MatchError::InvalidPattern {
                rule: id.0,
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        let invalid = |source| MatchError::InvalidPattern {
            rule: id.0,
            pattern: patterns.join(", "),
            source,
        };
        Ok(Self {
            id,
            files: files.build().map_err(invalid)?,
            dirs: dirs.build().map_err(invalid)?,
            patterns,
            reaction,
            scope_root,
        })
    }

    /// Does this rule match the record?
    pub fn is_match(&self, record: &ChangeRecord) -> bool {
        let Some(relative) = self.relative(&record.path) else {
            return false;
        };
        if record.kind.is_dir() {
            self.dirs.is_match(relative)
        } else {
            self.files.is_match(relative)
        }
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.scope_root).ok()
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("id", &self.id)
            .field("patterns", &self.patterns)
            .field("reaction", &self.reaction)
            .field("scope_root", &self.scope_root)
            .finish()
    }
}

/// Ordered, immutable rule list.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<MatchRule>,
}

impl RuleSet {
    /// Build from rules in declaration order.
    ///
    /// Ids are reassigned from the position so that order and id always agree.
    pub fn new(rules: Vec<MatchRule>) -> Self {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(i, mut rule)| {
                rule.id = RuleId(i);
                rule
            })
            .collect();
        Self { rules }
    }

    /// Every rule matching the record, in declaration order.
    pub fn matches(&self, record: &ChangeRecord) -> Vec<&MatchRule> {
        self.rules.iter().filter(|r| r.is_match(record)).collect()
    }

    pub fn get(&self, id: RuleId) -> Option<&MatchRule> {
        self.rules.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::record::ChangeKind;

    const ROOT: &str = "/site";

    fn rule(patterns: &[&str]) -> MatchRule {
        MatchRule::new(
            RuleId(0),
            patterns.iter().map(|p| p.to_string()).collect(),
            ROOT,
            ReactionKind::Default,
        )
        .unwrap()
    }

    fn record(path: &str, kind: ChangeKind) -> ChangeRecord {
        ChangeRecord::now(Path::new(ROOT).join(path), kind)
    }

    fn modified(path: &str) -> ChangeRecord {
        record(path, ChangeKind::Modified)
    }

    #[test]
    fn test_star_stays_in_one_segment() {
        let r = rule(&["*.css"]);
        assert!(r.is_match(&modified("styles.css")));
        assert!(!r.is_match(&modified("public/styles.css")));
    }

    #[test]
    fn test_double_star_is_recursive() {
        let r = rule(&["templates/**/*.gohtml"]);
        assert!(r.is_match(&modified("templates/index.gohtml")));
        assert!(r.is_match(&modified("templates/partials/nav/top.gohtml")));
        assert!(!r.is_match(&modified("templates/index.html")));
        assert!(!r.is_match(&modified("web/templates/index.gohtml")));
    }

    #[test]
    fn test_literal_and_case_sensitive() {
        let r = rule(&["public/css/styles.css"]);
        assert!(r.is_match(&modified("public/css/styles.css")));
        assert!(!r.is_match(&modified("public/css/Styles.css")));
        assert!(!r.is_match(&modified("public/css/styles.css.map")));
    }

    #[test]
    fn test_any_pattern_matches() {
        let r = rule(&["public/js/*.js", "templates/**/*.gohtml"]);
        assert!(r.is_match(&modified("public/js/app.js")));
        assert!(r.is_match(&modified("templates/a.gohtml")));
        assert!(!r.is_match(&modified("public/js/vendor/lib.js")));
    }

    #[test]
    fn test_outside_scope_root_never_matches() {
        let r = rule(&["**/*.css"]);
        let outside = ChangeRecord::now("/elsewhere/styles.css", ChangeKind::Modified);
        assert!(!r.is_match(&outside));
    }

    #[test]
    fn test_directory_records_need_directory_patterns() {
        let files = rule(&["public/**"]);
        let dirs = rule(&["public/*/"]);

        let dir_event = record("public/img", ChangeKind::DirCreated);
        assert!(!files.is_match(&dir_event));
        assert!(dirs.is_match(&dir_event));

        // File records ignore directory patterns
        assert!(!dirs.is_match(&record("public/img", ChangeKind::Created)));
        assert!(files.is_match(&record("public/img/a.png", ChangeKind::Created)));
    }

    #[test]
    fn test_no_match_returns_empty() {
        let set = RuleSet::new(vec![rule(&["*.css"])]);
        assert!(set.matches(&modified("notes.txt")).is_empty());
    }

    #[test]
    fn test_overlapping_rules_in_declaration_order() {
        let set = RuleSet::new(vec![rule(&["**/*.js"]), rule(&["**"]), rule(&["*.css"])]);

        let hits: Vec<RuleId> = set
            .matches(&modified("styles.css"))
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(hits, [RuleId(1), RuleId(2)]);

        let single: Vec<RuleId> = set
            .matches(&modified("app.js"))
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(single, [RuleId(0), RuleId(1)]);
    }

    #[test]
    fn test_ids_follow_position() {
        let set = RuleSet::new(vec![rule(&["a"]), rule(&["b"])]);
        let ids: Vec<_> = set.iter().map(|r| r.id).collect();
        assert_eq!(ids, [RuleId(0), RuleId(1)]);
        assert_eq!(set.get(RuleId(1)).unwrap().patterns, ["b"]);
        assert!(set.get(RuleId(2)).is_none());
    }

    #[test]
    fn test_invalid_pattern_is_match_error() {
        let err = MatchRule::new(
            RuleId(3),
            vec!["ok/*.css".into(), "broken/[".into()],
            ROOT,
            ReactionKind::Default,
        )
        .unwrap_err();
        match err {
            MatchError::InvalidPattern { rule, pattern, .. } => {
                assert_eq!(rule, 3);
                assert_eq!(pattern, "broken/[");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_rule_rejected() {
        let err = MatchRule::new(RuleId(1), vec![], ROOT, ReactionKind::Default).unwrap_err();
        assert!(matches!(err, MatchError::EmptyRule(1)));
    }

    #[test]
    fn test_relative_scope_rejected() {
        let err = MatchRule::new(RuleId(0), vec!["*".into()], "web", ReactionKind::Default)
            .unwrap_err();
        assert!(matches!(err, MatchError::RelativeScope { .. }));
    }
}
