//! Actor Coordinator - Wires up the Live Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Compiles rules and ignore patterns from the config
//! - Creates communication channels
//! - Starts the OS watcher and the WebSocket acceptor
//! - Runs the actors until shutdown

mod runtime;
mod watch_paths;

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{WatchActor, spawn_watcher};
use super::messages::{ReactorMsg, WatchMsg, WsMsg};
use super::reactor::ReactorActor;
use super::ws::WsActor;
use crate::config::SyncConfig;
use crate::reload::reaction::{Notifier, ReactionExecutor};
use crate::reload::registry::ClientRegistry;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<SyncConfig>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create from Arc<SyncConfig>.
    pub fn with_config(config: Arc<SyncConfig>) -> Self {
        Self {
            config,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let config = Arc::clone(&self.config);

        let rules = Arc::new(config.compile_rules()?);
        let ignore = Arc::new(config.ignore_set()?);

        let (watch_tx, watch_rx) = mpsc::channel::<WatchMsg>(CHANNEL_BUFFER);
        let (reactor_tx, reactor_rx) = mpsc::channel::<ReactorMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let actual_port = crate::reload::server::start_ws_server_with_channel(
            config.serve.interface,
            config.serve.ws_port,
            ws_tx.clone(),
        )
        .context("websocket server failed")?;
        crate::cli::serve::set_actual_ws_port(actual_port);
        crate::debug!("ws"; "ws://{}:{}", config.serve.interface, actual_port);

        let roots = watch_paths::collect_watch_roots(&config);
        let watcher = spawn_watcher(roots, ignore, &config.watch.events, watch_tx.clone())
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        crate::debug!("watch"; "{} root(s), {} rule(s)", config.watch.roots.len(), rules.len());

        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let executor = ReactionExecutor::new(Arc::clone(&rules), Notifier::new(notice_tx));

        let watch_actor = WatchActor::new(watch_rx, reactor_tx.clone(), rules, config.windows())
            .with_watcher(watcher);
        let reactor_actor =
            ReactorActor::new(reactor_rx, ws_tx.clone(), executor, notice_rx, config.serve.notify);
        let registry = Arc::new(ClientRegistry::new());
        let ws_actor = WsActor::new(ws_rx, registry, config.heartbeat());

        crate::debug!("actor"; "start");
        let senders = runtime::Senders {
            watch: watch_tx,
            reactor: reactor_tx,
            ws: ws_tx,
        };
        runtime::run_actors(
            watch_actor,
            reactor_actor,
            ws_actor,
            senders,
            self.shutdown_rx.take(),
        )
        .await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
