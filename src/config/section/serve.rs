//! `[serve]` section configuration.
//!
//! Contains proxy front-end and live reload endpoint settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # Proxy front-end port
//! ws_port = 35729             # Live reload WebSocket port
//! proxy = "localhost:8080"    # Backend application
//! notify = false              # Forward reaction notices to browsers
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Proxy and live reload endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// Proxy front-end port.
    pub port: u16,

    /// WebSocket port browsers connect to.
    pub ws_port: u16,

    /// Backend address, with or without scheme.
    pub proxy: String,

    /// Forward reaction notices to browsers.
    pub notify: bool,

    /// Open a browser on start. Accepted for compatibility, never acted on.
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            proxy: "localhost:8080".into(),
            notify: false,
            open: false,
        }
    }
}

impl ServeConfig {
    /// Backend base URL (`http://` is assumed when no scheme is given).
    pub fn proxy_url(&self) -> Result<url::Url, url::ParseError> {
        let raw = self.proxy.trim().trim_end_matches('/');
        if raw.contains("://") {
            url::Url::parse(raw)
        } else {
            url::Url::parse(&format!("http://{raw}"))
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.proxy_url() {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => diag.error_with_hint(
                FieldPath::new("serve.proxy"),
                format!("unsupported scheme `{}`", url.scheme()),
                "use an http:// or https:// backend",
            ),
            Err(e) => diag.error_with_hint(
                FieldPath::new("serve.proxy"),
                format!("invalid backend address `{}`: {e}", self.proxy),
                "e.g. proxy = \"localhost:8080\"",
            ),
        }

        if self.port == self.ws_port && self.port != 0 {
            diag.error(
                FieldPath::new("serve.ws_port"),
                format!("ws_port must differ from port ({})", self.port),
            );
        }

        if self.open {
            diag.warn(FieldPath::new("serve.open"), "opening a browser is not supported");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 3001\nws_port = 3002\n\
             proxy = \"127.0.0.1:9000\"",
        );

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.serve.port, 3001);
        assert_eq!(config.serve.ws_port, 3002);
        assert_eq!(config.serve.proxy, "127.0.0.1:9000");
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 35729);
        assert_eq!(config.serve.proxy, "localhost:8080");
        assert!(!config.serve.notify);
        assert!(!config.serve.open);
    }

    #[test]
    fn test_proxy_url_scheme() {
        let mut serve = ServeConfig::default();
        assert_eq!(serve.proxy_url().unwrap().as_str(), "http://localhost:8080/");

        serve.proxy = "https://api.local/".into();
        assert_eq!(serve.proxy_url().unwrap().as_str(), "https://api.local/");
    }

    #[test]
    fn test_validate_rejects_same_ports_and_bad_scheme() {
        let serve = ServeConfig {
            ws_port: 3000,
            proxy: "ftp://files".into(),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        serve.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
