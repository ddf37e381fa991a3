//! Debounce scheduler.
//!
//! Coalesces bursts of matches per rule into one pending reaction. Each rule
//! is a tiny state machine:
//!
//! ```text
//!            submit                      submit (last_seen_at = t)
//!   Idle ───────────────> Pending ──┐ <──────────────────────────┐
//!    ^                       │      └────────────────────────────┘
//!    └──── deadline passed ──┘ (take_ready hands the reaction off)
//! ```
//!
//! Deadline of a pending reaction:
//!
//! ```text
//! min( max(first_seen_at + delay, last_seen_at + debounce), first_seen_at + max_wait )
//! ```
//!
//! - `delay` is the minimum wait after the first event (settle time)
//! - `debounce` is the quiet period after the latest event (trailing repeats)
//! - `max_wait` caps the total wait so continuous writes cannot starve a rule
//!
//! Deadlines are derived from state on every query, never stored as timers,
//! so re-arming can never leave a stale timer behind. The scheduler owns no
//! clock; callers pass `Instant`s, which keeps it deterministic under test.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::matcher::RuleId;

/// Sleep used when nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Default ceiling multiplier applied to the debounce window.
pub const MAX_WAIT_FACTOR: u32 = 4;

/// Window configuration shared by all rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub delay: Duration,
    pub debounce: Duration,
    pub max_wait: Duration,
}

impl Windows {
    /// Windows with the default ceiling (`4 × debounce`, at least `delay`).
    pub fn new(delay: Duration, debounce: Duration) -> Self {
        Self {
            delay,
            debounce,
            max_wait: (debounce * MAX_WAIT_FACTOR).max(delay),
        }
    }

    /// Override the starvation ceiling. Never shorter than `delay`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait.max(self.delay);
        self
    }

    /// Both windows disabled: reactions fire on first submission.
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero() && self.debounce.is_zero()
    }
}

/// Coalesced matches for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReaction {
    pub rule_id: RuleId,
    pub first_seen_at: Instant,
    pub last_seen_at: Instant,
    pub affected_paths: BTreeSet<PathBuf>,
}

impl PendingReaction {
    fn new(rule_id: RuleId, path: PathBuf, at: Instant) -> Self {
        Self {
            rule_id,
            first_seen_at: at,
            last_seen_at: at,
            affected_paths: BTreeSet::from([path]),
        }
    }

    fn absorb(&mut self, path: PathBuf, at: Instant) {
        // Out-of-order timestamps never move the window backwards.
        self.last_seen_at = self.last_seen_at.max(at);
        self.affected_paths.insert(path);
    }

    /// Delay window satisfied at `now`.
    pub fn delay_elapsed(&self, windows: &Windows, now: Instant) -> bool {
        now >= self.first_seen_at + windows.delay
    }

    /// Quiet period satisfied at `now`.
    pub fn quiet_elapsed(&self, windows: &Windows, now: Instant) -> bool {
        now >= self.last_seen_at + windows.debounce
    }

    /// When this reaction fires.
    pub fn deadline(&self, windows: &Windows) -> Instant {
        let natural =
            (self.first_seen_at + windows.delay).max(self.last_seen_at + windows.debounce);
        natural.min(self.first_seen_at + windows.max_wait)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.affected_paths.iter().cloned().collect()
    }
}

/// Observable per-rule state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Idle,
    Pending {
        first_seen_at: Instant,
        last_seen_at: Instant,
    },
}

/// Per-rule debounce state machines.
#[derive(Debug)]
pub struct DebounceScheduler {
    windows: Windows,
    pending: FxHashMap<RuleId, PendingReaction>,
}

impl DebounceScheduler {
    pub fn new(windows: Windows) -> Self {
        Self {
            windows,
            pending: FxHashMap::default(),
        }
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    /// Record a match of `rule_id` on `path` observed at `at`.
    ///
    /// Returns the reaction right away when both windows are zero.
    pub fn submit(
        &mut self,
        rule_id: RuleId,
        path: impl Into<PathBuf>,
        at: Instant,
    ) -> Option<PendingReaction> {
        let path = path.into();

        if self.windows.is_immediate() {
            return Some(PendingReaction::new(rule_id, path, at));
        }

        match self.pending.get_mut(&rule_id) {
            Some(pending) => {
                crate::debug!("debounce"; "rule {} re-armed: {}", rule_id, path.display());
                pending.absorb(path, at);
            }
            None => {
                crate::debug!("debounce"; "rule {} pending: {}", rule_id, path.display());
                self.pending
                    .insert(rule_id, PendingReaction::new(rule_id, path, at));
            }
        }
        None
    }

    pub fn state(&self, rule_id: RuleId) -> WindowState {
        match self.pending.get(&rule_id) {
            Some(p) => WindowState::Pending {
                first_seen_at: p.first_seen_at,
                last_seen_at: p.last_seen_at,
            },
            None => WindowState::Idle,
        }
    }

    /// Earliest deadline across all pending rules.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|p| p.deadline(&self.windows))
            .min()
    }

    /// Precise sleep duration until the next deadline.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        match self.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => IDLE_SLEEP,
        }
    }

    /// Remove and return every reaction due at `now`, in declaration order.
    pub fn take_ready(&mut self, now: Instant) -> Vec<PendingReaction> {
        let windows = self.windows;
        let mut ready: Vec<RuleId> = self
            .pending
            .values()
            .filter(|p| p.deadline(&windows) <= now)
            .map(|p| p.rule_id)
            .collect();
        ready.sort_unstable();

        ready
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    /// Re-arm every pending rule as if it had just matched.
    ///
    /// Used when the watcher reports lost events. Returns the touched count.
    pub fn touch_all(&mut self, at: Instant) -> usize {
        for pending in self.pending.values_mut() {
            pending.last_seen_at = pending.last_seen_at.max(at);
        }
        self.pending.len()
    }

    /// Drop all pending reactions without firing them.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }
}
