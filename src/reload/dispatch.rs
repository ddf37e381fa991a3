//! Broadcast dispatcher.
//!
//! Delivers one message to every client present in a registry snapshot.
//! Delivery only enqueues into the client's outbox, so a slow or dead client
//! never holds up the others. Each outbox is drained by a single connection
//! thread, which gives per-client FIFO ordering.

use std::sync::Arc;

use super::error::DeliveryError;
use super::message::{ClientMessage, DispatchCommand};
use super::registry::{ClientHandle, ClientId, ClientRegistry};

/// Outcome of one broadcast.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    /// Clients unregistered between snapshot and delivery.
    pub skipped: usize,
    /// Clients removed because delivery failed.
    pub dropped: Vec<(ClientId, DeliveryError)>,
}

pub struct BroadcastDispatcher {
    registry: Arc<ClientRegistry>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Deliver a command to every client registered at call time.
    pub fn dispatch(&self, command: &DispatchCommand) -> DispatchReport {
        self.broadcast(ClientMessage::from(command))
    }

    /// Deliver a reaction notice with the same semantics as `dispatch`.
    pub fn notice(&self, message: &str) -> DispatchReport {
        self.broadcast(ClientMessage::notice(message))
    }

    fn broadcast(&self, message: ClientMessage) -> DispatchReport {
        self.deliver(self.registry.active_clients(), message)
    }

    /// Deliver to a snapshot taken earlier. Members that left since are skipped.
    fn deliver(&self, snapshot: Vec<ClientHandle>, message: ClientMessage) -> DispatchReport {
        let mut report = DispatchReport::default();

        if snapshot.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return report;
        }

        for client in snapshot {
            if !self.registry.is_registered(client.id) {
                report.skipped += 1;
                continue;
            }
            match client.deliver(message.clone()) {
                Ok(()) => report.delivered += 1,
                // Unregistered concurrently after the membership check
                Err(DeliveryError::Closed) => report.skipped += 1,
                Err(e) => {
                    crate::debug!("ws"; "{} dropped: {}", client.id, e);
                    self.registry.unregister(client.id);
                    report.dropped.push((client.id, e));
                }
            }
        }

        crate::debug!("ws"; "broadcast to {} clients", report.delivered);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::Receiver;

    fn connect(registry: &ClientRegistry) -> (ClientHandle, Receiver<ClientMessage>) {
        let (handle, rx) = ClientHandle::with_outbox(registry.next_id());
        registry.register(handle.clone());
        (handle, rx)
    }

    fn drain(rx: &Receiver<ClientMessage>) -> Vec<ClientMessage> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_scoped_update_reaches_all_clients() {
        let registry = Arc::new(ClientRegistry::new());
        let (_a, rx_a) = connect(&registry);
        let (_b, rx_b) = connect(&registry);
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));

        let report = dispatcher.dispatch(&DispatchCommand::scoped("*.css"));
        assert_eq!(report.delivered, 2);

        let expected = ClientMessage::Scoped {
            scope: "*.css".into(),
        };
        assert_eq!(drain(&rx_a), [expected.clone()]);
        assert_eq!(drain(&rx_b), [expected]);
    }

    #[test]
    fn test_late_registration_misses_command() {
        let registry = Arc::new(ClientRegistry::new());
        let (_early, rx_early) = connect(&registry);
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));

        dispatcher.dispatch(&DispatchCommand::full_reload());
        let (_late, rx_late) = connect(&registry);

        assert_eq!(drain(&rx_early), [ClientMessage::Full]);
        assert!(drain(&rx_late).is_empty());
    }

    #[test]
    fn test_silently_closed_client_is_dropped() {
        let registry = Arc::new(ClientRegistry::new());
        let (_ok, rx_ok) = connect(&registry);
        let (dead, rx_dead) = connect(&registry);
        let (_ok2, rx_ok2) = connect(&registry);
        drop(rx_dead); // connection thread died without notice

        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));
        let report = dispatcher.dispatch(&DispatchCommand::full_reload());

        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, [(dead.id, DeliveryError::Disconnected)]);
        assert!(!registry.is_registered(dead.id));
        assert_eq!(drain(&rx_ok), [ClientMessage::Full]);
        assert_eq!(drain(&rx_ok2), [ClientMessage::Full]);
    }

    #[test]
    fn test_unregistered_mid_dispatch_is_skipped() {
        let registry = Arc::new(ClientRegistry::new());
        let (gone, rx_gone) = connect(&registry);
        let (_stay, rx_stay) = connect(&registry);
        let (_other, rx_other) = connect(&registry);
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));

        // Snapshot was taken, then the client left before its turn
        let snapshot = registry.active_clients();
        registry.unregister(gone.id);
        let report = dispatcher.deliver(snapshot, ClientMessage::Full);

        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.dropped.is_empty());
        assert!(drain(&rx_gone).is_empty());
        assert_eq!(drain(&rx_stay), [ClientMessage::Full]);
        assert_eq!(drain(&rx_other), [ClientMessage::Full]);
    }

    #[test]
    fn test_saturated_client_dropped_others_unaffected() {
        let registry = Arc::new(ClientRegistry::new());
        let (stuck, _rx_stuck) = connect(&registry);
        let (_fine, rx_fine) = connect(&registry);
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));

        for _ in 0..crate::reload::registry::OUTBOX_CAPACITY {
            stuck.deliver(ClientMessage::Full).unwrap();
        }
        let report = dispatcher.dispatch(&DispatchCommand::full_reload());
        assert_eq!(report.dropped, [(stuck.id, DeliveryError::Saturated)]);
        assert_eq!(drain(&rx_fine), [ClientMessage::Full]);
    }

    #[test]
    fn test_per_client_fifo() {
        let registry = Arc::new(ClientRegistry::new());
        let (_c, rx) = connect(&registry);
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));

        dispatcher.dispatch(&DispatchCommand::scoped("*.css"));
        dispatcher.notice("templates changed");
        dispatcher.dispatch(&DispatchCommand::full_reload());

        assert_eq!(
            drain(&rx),
            [
                ClientMessage::Scoped {
                    scope: "*.css".into()
                },
                ClientMessage::notice("templates changed"),
                ClientMessage::Full,
            ]
        );
    }

    #[test]
    fn test_no_clients() {
        let dispatcher = BroadcastDispatcher::new(Arc::new(ClientRegistry::new()));
        assert_eq!(
            dispatcher.dispatch(&DispatchCommand::full_reload()),
            DispatchReport::default()
        );
    }
}
