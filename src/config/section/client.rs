//! `[client]` section configuration.
//!
//! ```toml
//! [client]
//! heartbeat = 5000   # ms between pings
//! timeout = 15000    # ms without an answer before a client is dropped
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actor::Heartbeat;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub heartbeat: u64,
    pub timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat: 5000,
            timeout: 15000,
        }
    }
}

impl ClientConfig {
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            interval: Duration::from_millis(self.heartbeat),
            timeout: Duration::from_millis(self.timeout),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.heartbeat == 0 {
            diag.error(FieldPath::new("client.heartbeat"), "heartbeat must be positive");
        }
        if self.timeout <= self.heartbeat {
            diag.error_with_hint(
                FieldPath::new("client.timeout"),
                "timeout must be longer than heartbeat",
                "a timeout of three heartbeats tolerates two lost pongs",
            );
        }
    }
}
