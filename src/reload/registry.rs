//! Client registry.
//!
//! Tracks connected browsers. Registration and removal happen concurrently
//! from accept/connection threads while the dispatcher iterates, so the
//! membership lives in a `DashMap` and iteration always works on a cloned
//! snapshot (no shard lock is held during delivery).
//!
//! A handle carries a shared `closed` flag: once unregistered, every clone of
//! the handle (including clones held in an in-flight dispatch snapshot)
//! refuses further deliveries.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender, TrySendError};
use dashmap::DashMap;
use parking_lot::Mutex;

use super::error::DeliveryError;
use super::message::ClientMessage;

/// Messages a slow client may have queued before it is dropped.
pub const OUTBOX_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

#[derive(Debug)]
struct Liveness {
    last_ack_at: Mutex<Instant>,
    closed: AtomicBool,
}

/// One connected browser.
///
/// `connection` is the sending half of the client's outbox; the connection
/// thread owns the receiving half and the socket.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ClientId,
    pub connected_at: Instant,
    connection: Sender<ClientMessage>,
    liveness: Arc<Liveness>,
}

impl ClientHandle {
    pub fn new(id: ClientId, connection: Sender<ClientMessage>) -> Self {
        let now = Instant::now();
        Self {
            id,
            connected_at: now,
            connection,
            liveness: Arc::new(Liveness {
                last_ack_at: Mutex::new(now),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Handle plus the outbox receiver for the connection thread.
    pub fn with_outbox(id: ClientId) -> (Self, Receiver<ClientMessage>) {
        let (tx, rx) = crossbeam::channel::bounded(OUTBOX_CAPACITY);
        (Self::new(id, tx), rx)
    }

    /// Queue a message. Never blocks.
    pub fn deliver(&self, message: ClientMessage) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.connection.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Saturated,
            TrySendError::Disconnected(_) => DeliveryError::Disconnected,
        })
    }

    /// Record a heartbeat or delivery acknowledgement.
    pub fn acknowledge(&self) {
        self.acknowledge_at(Instant::now());
    }

    pub fn acknowledge_at(&self, at: Instant) {
        let mut last = self.liveness.last_ack_at.lock();
        if at > *last {
            *last = at;
        }
    }

    pub fn last_ack_at(&self) -> Instant {
        *self.liveness.last_ack_at.lock()
    }

    pub fn is_closed(&self) -> bool {
        self.liveness.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.liveness.closed.store(true, Ordering::Release);
    }
}

/// Concurrent set of connected clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, ClientHandle>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id. Reconnecting clients always get a new one.
    pub fn next_id(&self) -> ClientId {
        ClientId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a client. Returns `false` for a handle that was already closed.
    pub fn register(&self, handle: ClientHandle) -> bool {
        if handle.is_closed() {
            return false;
        }
        let id = handle.id;
        self.clients.insert(id, handle);
        crate::debug!("ws"; "{} registered (total: {})", id, self.clients.len());
        true
    }

    /// Remove a client and close its handle.
    pub fn unregister(&self, id: ClientId) -> Option<ClientHandle> {
        let (_, handle) = self.clients.remove(&id)?;
        handle.close();
        crate::debug!("ws"; "{} unregistered (total: {})", id, self.clients.len());
        Some(handle)
    }

    /// Snapshot of the current membership.
    pub fn active_clients(&self) -> Vec<ClientHandle> {
        self.clients.iter().map(|e| e.value().clone()).collect()
    }

    pub fn is_registered(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Unregister clients that have not acknowledged within `timeout`.
    pub fn reap_stale(&self, timeout: Duration, now: Instant) -> Vec<ClientId> {
        let stale: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|e| now.saturating_duration_since(e.value().last_ack_at()) > timeout)
            .map(|e| *e.key())
            .collect();

        for id in &stale {
            self.unregister(*id);
        }
        stale
    }

    /// Close and remove every client (shutdown).
    pub fn close_all(&self) -> usize {
        let ids: Vec<ClientId> = self.clients.iter().map(|e| *e.key()).collect();
        ids.into_iter()
            .filter(|id| self.unregister(*id).is_some())
            .count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
