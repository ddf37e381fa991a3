//! Watch Actor
//!
//! Matches change records against the rule set and runs the per-rule
//! debounce windows. Reactions whose window closed are handed to the
//! ReactorActor by value.
//!
//! Architecture:
//! ```text
//! notify -> bridge thread (EventAdapter) -> WatchActor (RuleSet + DebounceScheduler) -> ReactorMsg
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{ReactorMsg, WatchMsg};
use crate::reload::error::WatcherGapError;
use crate::reload::ignore::IgnoreSet;
use crate::reload::matcher::RuleSet;
use crate::reload::record::{ChangeKind, ChangeRecord};
use crate::reload::scheduler::{DebounceScheduler, WindowState, Windows};
use crate::utils::plural::plural_count;

// notify::Event -> ChangeRecord conversion and filtering.
mod adapter;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


use adapter::EventAdapter;
use watch_roots::WatchRoots;

/// How often missing roots are re-checked.
const ROOT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Running OS watcher plus the roots it should cover.
pub struct WatcherHandle {
    watcher: RecommendedWatcher,
    roots: WatchRoots,
}

/// Start the OS watcher and a bridge thread feeding `tx`.
///
/// The watcher starts immediately, so events that happen while the rest of
/// the system starts up are buffered rather than lost.
pub fn spawn_watcher(
    roots: Vec<PathBuf>,
    ignore: Arc<IgnoreSet>,
    events: &[ChangeKind],
    tx: mpsc::Sender<WatchMsg>,
) -> notify::Result<WatcherHandle> {
    // notify does not support async, bridge through a std channel
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;

    let mut roots = WatchRoots::new(roots);
    roots.attach_existing(&mut watcher)?;

    let adapter = EventAdapter::new(ignore, events);
    std::thread::Builder::new()
        .name("livesync-watch".into())
        .spawn(move || {
            // Ends when the watcher (and with it notify_tx) is dropped
            while let Ok(result) = notify_rx.recv() {
                for msg in adapter.adapt(result) {
                    if tx.blocking_send(msg).is_err() {
                        return;
                    }
                }
            }
        })
        .map_err(|e| notify::Error::generic(&e.to_string()))?;

    Ok(WatcherHandle { watcher, roots })
}

/// Watch Actor - matching and debouncing
pub struct WatchActor {
    rx: mpsc::Receiver<WatchMsg>,
    reactor_tx: mpsc::Sender<ReactorMsg>,
    rules: Arc<RuleSet>,
    scheduler: DebounceScheduler,
    watcher: Option<WatcherHandle>,
}

impl WatchActor {
    pub fn new(
        rx: mpsc::Receiver<WatchMsg>,
        reactor_tx: mpsc::Sender<ReactorMsg>,
        rules: Arc<RuleSet>,
        windows: Windows,
    ) -> Self {
        Self {
            rx,
            reactor_tx,
            rules,
            scheduler: DebounceScheduler::new(windows),
            watcher: None,
        }
    }

    /// Keep the OS watcher alive for as long as the actor runs.
    pub fn with_watcher(mut self, watcher: WatcherHandle) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut root_check = tokio::time::interval(ROOT_CHECK_INTERVAL);
        root_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let sleep = self.scheduler.sleep_duration(Instant::now());
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(WatchMsg::Record(record)) => {
                        if self.on_record(record).await.is_err() {
                            break;
                        }
                    }
                    Some(WatchMsg::Gap(gap)) => self.on_gap(&gap),
                    Some(WatchMsg::Shutdown) | None => {
                        let dropped = self.scheduler.cancel_all();
                        crate::debug!("watch"; "shutting down ({} pending dropped)", dropped);
                        break;
                    }
                },
                _ = tokio::time::sleep(sleep) => {
                    if self.fire_ready().await.is_err() {
                        break;
                    }
                }
                _ = root_check.tick(), if self.watcher.is_some() => {
                    if let Some(handle) = self.watcher.as_mut() {
                        handle.roots.maintain(&mut handle.watcher);
                    }
                }
            }
        }
    }

    /// Submit a record to every matching rule.
    ///
    /// Returns `Err(())` if the ReactorActor shut down
    async fn on_record(&mut self, record: ChangeRecord) -> Result<(), ()> {
        let matched = self.rules.matches(&record);
        if matched.is_empty() {
            crate::debug!("watch"; "no rule for {} {}", record.kind, record.path.display());
            return Ok(());
        }

        crate::debug!(
            "watch"; "{} {} -> {} rule(s)",
            record.kind,
            record.path.display(),
            matched.len()
        );

        let ids: Vec<_> = matched.iter().map(|rule| rule.id).collect();
        for id in ids {
            if self.scheduler.state(id) == WindowState::Idle {
                crate::debug!("watch"; "rule {} window opens", id);
            }
            let immediate = self
                .scheduler
                .submit(id, record.path.clone(), record.observed_at);
            if let Some(pending) = immediate {
                self.reactor_tx
                    .send(ReactorMsg::Fire(pending))
                    .await
                    .map_err(|_| ())?;
            }
        }

        // A steady stream of records must not starve the ceiling
        self.fire_ready().await
    }

    /// Hand every due reaction to the reactor, in declaration order.
    async fn fire_ready(&mut self) -> Result<(), ()> {
        let now = Instant::now();
        let windows = *self.scheduler.windows();
        for pending in self.scheduler.take_ready(now) {
            let settled =
                pending.delay_elapsed(&windows, now) && pending.quiet_elapsed(&windows, now);
            let trigger = if settled {
                "quiet"
            } else {
                "max_wait"
            };
            crate::debug!(
                "watch"; "rule {} fires on {} ({} path(s))",
                pending.rule_id,
                trigger,
                pending.affected_paths.len()
            );
            self.reactor_tx
                .send(ReactorMsg::Fire(pending))
                .await
                .map_err(|_| ())?;
        }
        Ok(())
    }

    /// The watcher lost events: re-arm whatever is pending.
    fn on_gap(&mut self, gap: &WatcherGapError) {
        let touched = self.scheduler.touch_all(Instant::now());
        let detail = if touched == 0 {
            format!("{gap}; no pending reactions to re-arm")
        } else {
            format!("{gap}; re-armed {}", plural_count(touched, "pending reaction"))
        };
        crate::logger::status_warning(&detail);
    }
}
