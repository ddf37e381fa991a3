//! Pipeline tests: WatchActor -> ReactorActor -> WsActor with real windows.
//!
//! Records are injected straight into the watch channel and clients are
//! plain outboxes, so no OS watcher or socket is involved.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::fs::WatchActor;
use super::messages::{ReactorMsg, WatchMsg, WsMsg};
use super::reactor::ReactorActor;
use super::ws::{Heartbeat, WsActor};
use crate::reload::error::{ReactionError, WatcherGapError};
use crate::reload::matcher::{MatchRule, RuleId, RuleSet};
use crate::reload::message::ClientMessage;
use crate::reload::reaction::{Announce, Notifier, ReactionExecutor, ReactionKind, ScopedReload};
use crate::reload::record::{ChangeKind, ChangeRecord};
use crate::reload::registry::{ClientHandle, ClientRegistry};
use crate::reload::scheduler::Windows;

const ROOT: &str = "/app";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

struct Pipeline {
    watch_tx: mpsc::Sender<WatchMsg>,
    reactor_tx: mpsc::Sender<ReactorMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    registry: Arc<ClientRegistry>,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    fn start(rules: Vec<(&[&str], ReactionKind)>, windows: Windows, forward_notices: bool) -> Self {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(i, (patterns, reaction))| {
                let patterns = patterns.iter().map(|p| p.to_string()).collect();
                MatchRule::new(RuleId(i), patterns, ROOT, reaction).unwrap()
            })
            .collect();
        let rules = Arc::new(RuleSet::new(rules));

        let (watch_tx, watch_rx) = mpsc::channel(32);
        let (reactor_tx, reactor_rx) = mpsc::channel(32);
        let (ws_tx, ws_rx) = mpsc::channel(32);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let registry = Arc::new(ClientRegistry::new());
        let executor = ReactionExecutor::new(Arc::clone(&rules), Notifier::new(notice_tx));
        let heartbeat = Heartbeat {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
        };

        let watch = WatchActor::new(watch_rx, reactor_tx.clone(), rules, windows);
        let reactor = ReactorActor::new(
            reactor_rx,
            ws_tx.clone(),
            executor,
            notice_rx,
            forward_notices,
        );
        let ws = WsActor::new(ws_rx, Arc::clone(&registry), heartbeat);

        Self {
            watch_tx,
            reactor_tx,
            ws_tx,
            registry,
            handles: vec![
                tokio::spawn(watch.run()),
                tokio::spawn(reactor.run()),
                tokio::spawn(ws.run()),
            ],
        }
    }

    fn connect(&self) -> Receiver<ClientMessage> {
        let (handle, outbox) = ClientHandle::with_outbox(self.registry.next_id());
        assert!(self.registry.register(handle));
        outbox
    }

    async fn change(&self, path: &str, kind: ChangeKind) {
        let record = ChangeRecord::now(Path::new(ROOT).join(path), kind);
        self.watch_tx.send(WatchMsg::Record(record)).await.unwrap();
    }

    async fn shutdown(self) {
        let _ = self.watch_tx.send(WatchMsg::Shutdown).await;
        let _ = self.reactor_tx.send(ReactorMsg::Shutdown).await;
        let _ = self.ws_tx.send(WsMsg::Shutdown).await;
        for handle in self.handles {
            let _ = tokio::time::timeout(ms(500), handle).await;
        }
    }
}

fn windows(delay: u64, debounce: u64) -> Windows {
    Windows::new(ms(delay), ms(debounce))
}

/// The two rules of the reference setup.
fn reference_rules() -> Vec<(&'static [&'static str], ReactionKind)> {
    vec![
        (
            &["public/css/styles.css"],
            ReactionKind::custom(ScopedReload {
                scope: "*.css".into(),
            }),
        ),
        (
            &["templates/**/*.gohtml", "public/js/*.js"],
            ReactionKind::Default,
        ),
    ]
}

fn recv(outbox: &Receiver<ClientMessage>) -> ClientMessage {
    outbox.recv_timeout(Duration::from_secs(2)).expect("no message")
}

fn assert_silent(outbox: &Receiver<ClientMessage>, window: Duration) {
    if let Ok(message) = outbox.recv_timeout(window) {
        panic!("unexpected message: {message:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stylesheet_change_sends_scoped_update() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 50), false);
    let outbox = pipeline.connect();

    pipeline.change("public/css/styles.css", ChangeKind::Modified).await;

    assert_eq!(
        recv(&outbox),
        ClientMessage::Scoped {
            scope: "*.css".into()
        }
    );
    assert_silent(&outbox, ms(200));
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn template_change_sends_full_reload() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 50), false);
    let outbox = pipeline.connect();

    pipeline
        .change("templates/pages/index.gohtml", ChangeKind::Modified)
        .await;

    assert_eq!(recv(&outbox), ClientMessage::Full);
    assert_silent(&outbox, ms(200));
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_coalesces_into_one_command_after_quiet_period() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 250), false);
    let outbox = pipeline.connect();

    for _ in 0..10 {
        pipeline.change("public/js/app.js", ChangeKind::Modified).await;
        tokio::time::sleep(ms(5)).await;
    }
    let last = Instant::now();

    assert_eq!(recv(&outbox), ClientMessage::Full);
    assert!(last.elapsed() >= ms(200), "fired after {:?}", last.elapsed());
    assert_silent(&outbox, ms(400));
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmatched_change_sends_nothing() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 20), false);
    let outbox = pipeline.connect();

    pipeline.change("README.md", ChangeKind::Modified).await;
    pipeline.change("public/css/other.css", ChangeKind::Modified).await;

    assert_silent(&outbox, ms(200));
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_rules_fire_in_declaration_order() {
    let rules: Vec<(&[&str], ReactionKind)> = vec![
        (&["public/**"], ReactionKind::Default),
        (
            &["public/css/*.css"],
            ReactionKind::custom(ScopedReload {
                scope: "*.css".into(),
            }),
        ),
    ];
    let pipeline = Pipeline::start(rules, windows(0, 50), false);
    let outbox = pipeline.connect();

    pipeline.change("public/css/site.css", ChangeKind::Modified).await;

    assert_eq!(recv(&outbox), ClientMessage::Full);
    assert_eq!(
        recv(&outbox),
        ClientMessage::Scoped {
            scope: "*.css".into()
        }
    );
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_reaction_falls_back_to_full_reload() {
    let rules: Vec<(&[&str], ReactionKind)> = vec![
        (
            &["*.css"],
            ReactionKind::from_fn("broken", |_, _| Err(ReactionError::failed("broken", "boom"))),
        ),
        (
            &["*.js"],
            ReactionKind::from_fn("panicky", |_, _| panic!("reaction exploded")),
        ),
    ];
    let pipeline = Pipeline::start(rules, windows(0, 20), false);
    let outbox = pipeline.connect();

    pipeline.change("site.css", ChangeKind::Modified).await;
    assert_eq!(recv(&outbox), ClientMessage::Full);

    pipeline.change("app.js", ChangeKind::Modified).await;
    assert_eq!(recv(&outbox), ClientMessage::Full);
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silently_closed_client_is_dropped() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 20), false);
    let alive = pipeline.connect();
    let gone = pipeline.connect();
    drop(gone);

    pipeline
        .change("templates/layout.gohtml", ChangeKind::Modified)
        .await;

    assert_eq!(recv(&alive), ClientMessage::Full);
    let start = Instant::now();
    while pipeline.registry.len() != 1 {
        assert!(start.elapsed() < Duration::from_secs(2), "client not dropped");
        tokio::time::sleep(ms(10)).await;
    }
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notices_forwarded_before_command() {
    let rules: Vec<(&[&str], ReactionKind)> = vec![(
        &["*.go"],
        ReactionKind::custom(Announce {
            message: "backend rebuilt".into(),
            scope: None,
        }),
    )];
    let pipeline = Pipeline::start(rules, windows(0, 20), true);
    let outbox = pipeline.connect();

    pipeline.change("main.go", ChangeKind::Modified).await;

    assert_eq!(
        recv(&outbox),
        ClientMessage::Notice {
            message: "backend rebuilt (1 file)".into()
        }
    );
    assert_eq!(recv(&outbox), ClientMessage::Full);
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notices_not_forwarded_by_default() {
    let rules: Vec<(&[&str], ReactionKind)> = vec![(
        &["*.go"],
        ReactionKind::custom(Announce {
            message: "backend rebuilt".into(),
            scope: Some("*.css".into()),
        }),
    )];
    let pipeline = Pipeline::start(rules, windows(0, 20), false);
    let outbox = pipeline.connect();

    pipeline.change("main.go", ChangeKind::Modified).await;

    assert_eq!(
        recv(&outbox),
        ClientMessage::Scoped {
            scope: "*.css".into()
        }
    );
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_gap_rearms_pending_reaction() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 300), false);
    let outbox = pipeline.connect();
    let start = Instant::now();

    pipeline
        .change("templates/index.gohtml", ChangeKind::Modified)
        .await;
    tokio::time::sleep(ms(200)).await;
    pipeline
        .watch_tx
        .send(WatchMsg::Gap(WatcherGapError::Overflow))
        .await
        .unwrap();

    // Without the gap the rule would have fired at ~300 ms
    assert_silent(&outbox, ms(400).saturating_sub(start.elapsed()));
    assert_eq!(recv(&outbox), ClientMessage::Full);
    assert!(start.elapsed() >= ms(450), "fired after {:?}", start.elapsed());
    pipeline.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_closes_clients() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 20), false);
    let _outbox = pipeline.connect();
    let registry = Arc::clone(&pipeline.registry);

    pipeline.shutdown().await;

    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_drops_pending_reactions() {
    let pipeline = Pipeline::start(reference_rules(), windows(0, 300), false);
    let outbox = pipeline.connect();

    pipeline
        .change("templates/index.gohtml", ChangeKind::Modified)
        .await;
    tokio::time::sleep(ms(50)).await;
    pipeline.shutdown().await;

    // Past the point where the debounce window would have closed
    tokio::time::sleep(ms(400)).await;
    let received: Vec<_> = outbox.try_iter().collect();
    assert!(received.is_empty(), "pending reaction ran: {received:?}");
}
