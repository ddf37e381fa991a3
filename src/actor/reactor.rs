//! Reactor Actor
//!
//! Runs the reaction of every fired rule and forwards the resulting
//! dispatch command (plus any reaction notices) to the WsActor.
//!
//! ```text
//! WatchActor --Fire--> ReactorActor --Dispatch/Notice--> WsActor
//! ```

use tokio::sync::mpsc;

use super::messages::{ReactorMsg, WsMsg};
use crate::reload::reaction::ReactionExecutor;
use crate::reload::scheduler::PendingReaction;

pub struct ReactorActor {
    rx: mpsc::Receiver<ReactorMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    executor: ReactionExecutor,
    /// Notices emitted by reactions through the `Notifier`
    notices: mpsc::UnboundedReceiver<String>,
    /// Forward notices to browsers (`serve.notify`)
    forward_notices: bool,
}

impl ReactorActor {
    pub fn new(
        rx: mpsc::Receiver<ReactorMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        executor: ReactionExecutor,
        notices: mpsc::UnboundedReceiver<String>,
        forward_notices: bool,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            executor,
            notices,
            forward_notices,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ReactorMsg::Fire(pending) => {
                    if self.fire(pending).await.is_err() {
                        break;
                    }
                }
                ReactorMsg::Shutdown => {
                    crate::debug!("reactor"; "shutting down");
                    break;
                }
            }
        }
    }

    /// Execute one reaction. Returns `Err(())` if the WsActor shut down.
    async fn fire(&mut self, pending: PendingReaction) -> Result<(), ()> {
        let paths = pending.paths();
        let execution = self.executor.execute(pending.rule_id, &paths);

        if let Some(error) = &execution.error {
            crate::logger::status_error(
                &format!("rule {} reaction failed, full reload", pending.rule_id),
                &error.to_string(),
            );
        }

        // Notices were emitted synchronously by the reaction
        while let Ok(notice) = self.notices.try_recv() {
            if self.forward_notices {
                self.ws_tx.send(WsMsg::Notice(notice)).await.map_err(|_| ())?;
            }
        }

        crate::debug!(
            "reactor"; "rule {}: {} for {} path(s)",
            pending.rule_id,
            execution.command.describe(),
            paths.len()
        );
        self.ws_tx
            .send(WsMsg::Dispatch(execution.command))
            .await
            .map_err(|_| ())
    }
}
