use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actor::fs::WatchActor;
use crate::actor::messages::{ReactorMsg, WatchMsg, WsMsg};
use crate::actor::reactor::ReactorActor;
use crate::actor::ws::WsActor;

/// How long each actor gets to finish after `Shutdown`.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Poll interval of the external shutdown signal.
const SIGNAL_POLL: Duration = Duration::from_millis(100);

/// Inbound channel of every actor, used to deliver `Shutdown`.
pub(super) struct Senders {
    pub watch: mpsc::Sender<WatchMsg>,
    pub reactor: mpsc::Sender<ReactorMsg>,
    pub ws: mpsc::Sender<WsMsg>,
}

/// Run all actors concurrently until the signal fires or an actor stops.
///
/// Shutdown runs in pipeline order so that nothing upstream can feed a
/// stopped actor.
pub(super) async fn run_actors(
    watch: WatchActor,
    reactor: ReactorActor,
    ws: WsActor,
    senders: Senders,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut watch_handle = tokio::spawn(watch.run());
    let mut reactor_handle = tokio::spawn(reactor.run());
    let mut ws_handle = tokio::spawn(ws.run());

    tokio::select! {
        _ = wait_for_signal(shutdown_rx) => {
            crate::debug!("actor"; "shutdown signal received");
        }
        _ = &mut watch_handle => crate::debug!("actor"; "watch actor stopped"),
        _ = &mut reactor_handle => crate::debug!("actor"; "reactor actor stopped"),
        _ = &mut ws_handle => crate::debug!("actor"; "ws actor stopped"),
    }

    let _ = senders.watch.send(WatchMsg::Shutdown).await;
    join(watch_handle).await;
    let _ = senders.reactor.send(ReactorMsg::Shutdown).await;
    join(reactor_handle).await;
    let _ = senders.ws.send(WsMsg::Shutdown).await;
    join(ws_handle).await;
}

async fn join(handle: JoinHandle<()>) {
    // A handle that already completed inside the select must not be polled again
    if handle.is_finished() {
        return;
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
        crate::debug!("actor"; "actor did not stop in time");
    }
}

/// Resolve once the signal fires. Without a signal, never resolves.
async fn wait_for_signal(rx: Option<Receiver<()>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => tokio::time::sleep(SIGNAL_POLL).await,
        }
    }
}
