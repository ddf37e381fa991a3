//! Config field paths.

/// Dotted path of a config field as it appears in `livesync.toml`,
/// e.g. `watch.max_wait` or `rules.reaction.scope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}
