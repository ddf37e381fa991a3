//! Embedded static resources.
//!
//! - `serve` - Proxy front-end resources (live reload client script)

pub mod serve {
    /// URL the proxy serves the client script from.
    pub const CLIENT_JS_PATH: &str = "/__livesync/client.js";

    const CLIENT_JS: &str = include_str!("serve/client.js");
    const WS_PORT_PLACEHOLDER: &str = "__LIVESYNC_WS_PORT__";

    /// Browser-side live reload client, wired to `ws_port`.
    pub fn client_js(ws_port: u16) -> String {
        CLIENT_JS.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
    }

    /// Script tag injected into proxied HTML pages.
    pub fn client_tag() -> String {
        format!(r#"<script async src="{CLIENT_JS_PATH}"></script>"#)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_client_js_port_injected() {
            let js = client_js(35800);
            assert!(js.contains("35800"));
            assert!(!js.contains(WS_PORT_PLACEHOLDER));
        }

        #[test]
        fn test_client_tag_points_at_script() {
            assert!(client_tag().contains(CLIENT_JS_PATH));
        }
    }
}
