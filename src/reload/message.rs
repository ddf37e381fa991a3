//! Dispatch commands and the browser wire protocol.
//!
//! One JSON message is sent per [`DispatchCommand`]:
//!
//! ```text
//! {"kind":"full"}                    reload the whole page
//! {"kind":"scoped","scope":"*.css"}  refresh matching resources only
//! {"kind":"notice","message":"..."}  reaction notice (serve.notify)
//! {"kind":"connected","version":..}  sent once after the handshake
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// What the browser should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    FullReload,
    ScopedUpdate,
}

/// Update issued by the reaction executor. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCommand {
    pub kind: DispatchKind,
    pub scope: Option<String>,
    pub issued_at: Instant,
}

impl DispatchCommand {
    pub fn full_reload() -> Self {
        Self {
            kind: DispatchKind::FullReload,
            scope: None,
            issued_at: Instant::now(),
        }
    }

    /// Scoped update, e.g. `scoped("*.css")` to re-inject stylesheets.
    pub fn scoped(scope: impl Into<String>) -> Self {
        Self {
            kind: DispatchKind::ScopedUpdate,
            scope: Some(scope.into()),
            issued_at: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn is_full_reload(&self) -> bool {
        self.kind == DispatchKind::FullReload
    }

    /// Short description for status output.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.scope) {
            (DispatchKind::ScopedUpdate, Some(scope)) => format!("scoped update ({scope})"),
            _ => "full reload".to_string(),
        }
    }
}

/// Message sent over the websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClientMessage {
    Full,
    Scoped { scope: String },
    Notice { message: String },
    Connected { version: String },
}

impl ClientMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"kind":"full"}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

impl From<&DispatchCommand> for ClientMessage {
    fn from(command: &DispatchCommand) -> Self {
        match (command.kind, &command.scope) {
            (DispatchKind::ScopedUpdate, Some(scope)) => Self::Scoped {
                scope: scope.clone(),
            },
            // A scoped update without a scope cannot be applied selectively.
            _ => Self::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let full = ClientMessage::from(&DispatchCommand::full_reload());
        assert_eq!(full.to_json(), r#"{"kind":"full"}"#);

        let scoped = ClientMessage::from(&DispatchCommand::scoped("*.css"));
        assert_eq!(scoped.to_json(), r#"{"kind":"scoped","scope":"*.css"}"#);
    }

    #[test]
    fn test_scoped_without_scope_degrades_to_full() {
        let command = DispatchCommand {
            kind: DispatchKind::ScopedUpdate,
            scope: None,
            issued_at: Instant::now(),
        };
        assert_eq!(ClientMessage::from(&command), ClientMessage::Full);
        assert_eq!(command.describe(), "full reload");
    }

    #[test]
    fn test_parse_notice() {
        let msg = ClientMessage::from_json(r#"{"kind":"notice","message":"hi"}"#).unwrap();
        assert_eq!(msg, ClientMessage::notice("hi"));
        assert!(ClientMessage::from_json(r#"{"kind":"patch"}"#).is_none());
    }

    #[test]
    fn test_connected_carries_version() {
        let json = ClientMessage::connected().to_json();
        assert!(json.contains(r#""kind":"connected""#));
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }
}
