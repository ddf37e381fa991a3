//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! level = "info"    # silent | info | debug
//! prefix = "BS"     # printed before every line
//! ```

use serde::{Deserialize, Serialize};

use crate::logger::LogLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub prefix: String,
}

impl LogConfig {
    /// Install as the process-wide logger settings.
    pub fn apply(&self) {
        crate::logger::set_level(self.level);
        crate::logger::set_prefix(&self.prefix);
    }
}
