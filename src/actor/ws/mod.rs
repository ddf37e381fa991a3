//! WebSocket Actor - broadcast to connected browsers
//!
//! This actor is responsible for:
//! - Handing new connections to their own connection thread
//! - Broadcasting dispatch commands and notices
//! - Reaping clients that stopped answering heartbeats
//!
//! # Architecture
//!
//! ```text
//! ReactorActor --[Dispatch/Notice]--> WsActor --[outbox]--> connection threads --> browsers
//!                                        ^
//!      acceptor thread --[AddClient]-----+
//! ```

mod client_io;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::messages::WsMsg;
use crate::reload::dispatch::{BroadcastDispatcher, DispatchReport};
use crate::reload::registry::ClientRegistry;
use crate::utils::plural::plural_count;

pub use client_io::Heartbeat;

/// WebSocket Actor - owns the dispatcher
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    dispatcher: BroadcastDispatcher,
    heartbeat: Heartbeat,
}

impl WsActor {
    pub fn new(
        rx: mpsc::Receiver<WsMsg>,
        registry: Arc<ClientRegistry>,
        heartbeat: Heartbeat,
    ) -> Self {
        Self {
            rx,
            dispatcher: BroadcastDispatcher::new(registry),
            heartbeat,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut reap = tokio::time::interval(self.heartbeat.interval);
        reap.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(WsMsg::Dispatch(command)) => {
                        let report = self.dispatcher.dispatch(&command);
                        report_status(&command.describe(), &report);
                    }
                    Some(WsMsg::Notice(message)) => {
                        self.dispatcher.notice(&message);
                    }
                    Some(WsMsg::AddClient(stream)) => {
                        client_io::spawn_connection(
                            stream,
                            Arc::clone(self.dispatcher.registry()),
                            self.heartbeat,
                        );
                    }
                    Some(WsMsg::Shutdown) | None => {
                        let closed = self.dispatcher.registry().close_all();
                        crate::debug!("ws"; "shutting down ({} clients closed)", closed);
                        break;
                    }
                },
                _ = reap.tick() => self.reap_stale(Instant::now()),
            }
        }
    }

    fn reap_stale(&self, now: Instant) {
        let reaped = self
            .dispatcher
            .registry()
            .reap_stale(self.heartbeat.timeout, now);
        for id in reaped {
            crate::debug!("ws"; "{} timed out", id);
        }
    }
}

fn report_status(what: &str, report: &DispatchReport) {
    crate::logger::status_success(&format!(
        "{what} -> {}",
        plural_count(report.delivered, "client")
    ));
    if !report.dropped.is_empty() {
        crate::debug!("ws"; "dropped {} unresponsive client(s)", report.dropped.len());
    }
}
