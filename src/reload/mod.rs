//! Reload Module
//!
//! Change classification and dispatch for live reload.
//!
//! # Architecture
//!
//! ```text
//! ChangeRecord -> RuleSet -> DebounceScheduler -> ReactionExecutor
//!                                   -> BroadcastDispatcher -> clients
//! ```
//!
//! # Modules
//!
//! - `record` - Normalized filesystem change records
//! - `matcher` - Rule compilation and matching
//! - `ignore` - Watcher ignore patterns
//! - `scheduler` - Per-rule delay/debounce windows
//! - `reaction` - Reactions and the failure-isolating executor
//! - `registry` - Connected client set
//! - `dispatch` - Snapshot broadcast to clients
//! - `message` - Dispatch commands and the browser wire format
//! - `error` - Error taxonomy
//! - `server` - WebSocket acceptor

pub mod dispatch;
pub mod error;
pub mod ignore;
pub mod matcher;
pub mod message;
pub mod reaction;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod server;
