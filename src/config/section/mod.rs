//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livesync.toml`:
//!
//! | Module   | TOML Section  | Purpose                               |
//! |----------|---------------|---------------------------------------|
//! | `serve`  | `[serve]`     | Proxy front-end and WebSocket ports   |
//! | `watch`  | `[watch]`     | Roots, ignores, events, timing        |
//! | `client` | `[client]`    | Heartbeat and client timeout          |
//! | `log`    | `[log]`       | Log level and prefix                  |
//! | `rule`   | `[[rules]]`   | Pattern to reaction bindings          |

mod client;
mod log;
mod rule;
mod serve;
mod watch;

pub use client::ClientConfig;
pub use log::LogConfig;
pub use rule::{ReactionConfig, RuleConfig};
pub use serve::ServeConfig;
pub use watch::WatchConfig;
