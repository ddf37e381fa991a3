//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! bridge --Record/Gap--> WatchActor --Fire--> ReactorActor --Dispatch--> WsActor
//! ```

use std::net::TcpStream;

use crate::reload::error::WatcherGapError;
use crate::reload::message::DispatchCommand;
use crate::reload::record::ChangeRecord;
use crate::reload::scheduler::PendingReaction;

// =============================================================================
// WatchActor Messages
// =============================================================================

/// Messages to Watch Actor
#[derive(Debug)]
pub enum WatchMsg {
    /// A normalized filesystem change
    Record(ChangeRecord),
    /// The watcher may have missed events
    Gap(WatcherGapError),
    /// Drop pending reactions and stop
    Shutdown,
}

// =============================================================================
// ReactorActor Messages
// =============================================================================

/// Messages to Reactor Actor
#[derive(Debug)]
pub enum ReactorMsg {
    /// A debounce window closed; the reaction moves here by value
    Fire(PendingReaction),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Broadcast a command to every registered client
    Dispatch(DispatchCommand),
    /// Broadcast a reaction notice
    Notice(String),
    /// New connection from the acceptor thread (handshake pending)
    AddClient(TcpStream),
    /// Close every client and stop
    Shutdown,
}
