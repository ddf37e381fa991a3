//! Backend forwarding.
//!
//! Requests are replayed against `serve.proxy` with a blocking client. The
//! response is buffered so HTML can be rewritten before it is returned.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tiny_http::Request;
use url::Url;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Request headers recomputed by the client.
const SKIP_REQUEST: &[&str] = &["host", "content-length", "accept-encoding"];

/// Response headers recomputed when the body is rewritten.
const SKIP_RESPONSE: &[&str] = &["content-length"];

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A buffered backend response.
#[derive(Debug)]
pub struct Upstream {
    pub status: u16,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Vec<u8>,
}

impl Upstream {
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type")
            .and_then(|v| std::str::from_utf8(v).ok())
            .unwrap_or_default()
    }

    /// Encoded bodies cannot be rewritten.
    pub fn is_encoded(&self) -> bool {
        self.header("content-encoding")
            .is_some_and(|v| !v.eq_ignore_ascii_case(b"identity"))
    }
}

pub struct Proxy {
    client: Client,
    base: Url,
}

impl Proxy {
    pub fn new(base: Url) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            // Backend handlers may legitimately be slow while they rebuild
            .timeout(None::<Duration>)
            .build()
            .context("failed to build proxy client")?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Backend URL for a request target (`/path?query`).
    pub fn target(&self, request_url: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = if request_url.starts_with('/') {
            request_url.to_string()
        } else {
            format!("/{request_url}")
        };
        Url::parse(&format!("{base}{path}"))
            .with_context(|| format!("invalid target {request_url}"))
    }

    /// Forward a request and buffer the response.
    pub fn forward(&self, request: &mut Request) -> Result<Upstream> {
        let target = self.target(request.url())?;
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .context("unsupported method")?;

        let mut builder = self.client.request(method, target);
        for header in request.headers() {
            let name = header.field.as_str().as_str();
            if is_forwardable(name, SKIP_REQUEST) {
                builder = builder.header(name, header.value.as_str());
            }
        }

        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("failed to read request body")?;
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().context("backend unreachable")?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| is_forwardable(name.as_str(), SKIP_RESPONSE))
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        let body = response
            .bytes()
            .context("failed to read backend response")?
            .to_vec();

        Ok(Upstream {
            status,
            headers,
            body,
        })
    }
}

fn is_forwardable(name: &str, skip: &[&str]) -> bool {
    !HOP_BY_HOP
        .iter()
        .chain(skip)
        .any(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(base: &str) -> Proxy {
        Proxy::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_target_keeps_path_and_query() {
        let proxy = proxy("http://localhost:8080/");
        assert_eq!(
            proxy.target("/posts/1?draft=true").unwrap().as_str(),
            "http://localhost:8080/posts/1?draft=true"
        );
    }

    #[test]
    fn test_target_under_base_path() {
        let proxy = proxy("http://localhost:8080/app");
        assert_eq!(
            proxy.target("/index.html").unwrap().as_str(),
            "http://localhost:8080/app/index.html"
        );
    }

    #[test]
    fn test_hop_by_hop_filtered() {
        assert!(!is_forwardable("Connection", &[]));
        assert!(!is_forwardable("Transfer-Encoding", SKIP_RESPONSE));
        assert!(!is_forwardable("Host", SKIP_REQUEST));
        assert!(!is_forwardable("Accept-Encoding", SKIP_REQUEST));
        assert!(is_forwardable("Cookie", SKIP_REQUEST));
        assert!(is_forwardable("Set-Cookie", SKIP_RESPONSE));
    }

    #[test]
    fn test_upstream_headers() {
        let upstream = Upstream {
            status: 200,
            headers: vec![
                ("Content-Type".into(), b"text/html; charset=utf-8".to_vec()),
                ("content-encoding".into(), b"gzip".to_vec()),
            ],
            body: Vec::new(),
        };
        assert_eq!(upstream.content_type(), "text/html; charset=utf-8");
        assert!(upstream.is_encoded());
    }
}
