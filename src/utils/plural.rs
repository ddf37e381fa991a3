//! Count formatting for log lines.

/// `0 clients`, `1 rule`, `3 pending reactions`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
