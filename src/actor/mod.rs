//! Actor System for Live Reload
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! WatchActor --> ReactorActor --> WsActor
//! (match, debounce)  (react)     (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher, rule matching and debounce windows
//! - `reactor` - Reaction execution
//! - `ws` - Client connections and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod reactor;
pub mod ws;

#[cfg(test)]
mod tests;

pub use coordinator::Coordinator;
pub use ws::Heartbeat;
