//! HTTP response handlers.

use super::content::maybe_inject_client;
use super::proxy::Upstream;
use anyhow::Result;
use std::io::Cursor;
use tiny_http::{Header, Request, Response, StatusCode};

const PLAIN: &str = "text/plain; charset=utf-8";
const JAVASCRIPT: &str = "text/javascript; charset=utf-8";

/// Respond with a backend response, injecting the client into HTML.
pub fn respond_upstream(request: Request, mut upstream: Upstream) -> Result<()> {
    let body = page_body(&mut upstream);
    let mut response = Response::from_data(body).with_status_code(StatusCode(upstream.status));
    for (name, value) in &upstream.headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_slice()) {
            response.add_header(header);
        }
    }
    request.respond(response)?;
    Ok(())
}

/// Take the body out of `upstream`, with the client script injected into
/// uncompressed HTML.
fn page_body(upstream: &mut Upstream) -> Vec<u8> {
    let body = std::mem::take(&mut upstream.body);
    if upstream.is_encoded() {
        body
    } else {
        maybe_inject_client(body, upstream.content_type())
    }
}

/// Respond with 502 Bad Gateway (backend unreachable).
pub fn respond_bad_gateway(request: Request, error: &anyhow::Error) -> Result<()> {
    let body = format!("502 Bad Gateway\n\n{error:#}");
    send_body(request, 502, PLAIN, body.into_bytes())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with client.js from memory.
pub fn respond_client_js(request: Request, ws_port: u16) -> Result<()> {
    let body = crate::embed::serve::client_js(ws_port);
    let mut response = with_content_type(Response::from_data(body.into_bytes()), JAVASCRIPT);
    if let Ok(header) = Header::from_bytes("Cache-Control", "no-store") {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = with_content_type(
        Response::from_data(body).with_status_code(StatusCode(status)),
        content_type,
    );
    request.respond(response)?;
    Ok(())
}

fn with_content_type(
    mut response: Response<Cursor<Vec<u8>>>,
    content_type: &str,
) -> Response<Cursor<Vec<u8>>> {
    if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
        response.add_header(header);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(headers: &[(&str, &str)], body: &str) -> Upstream {
        Upstream {
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_html_page_gets_client() {
        let mut page = upstream(&[("Content-Type", "text/html")], "<body></body>");
        let body = String::from_utf8(page_body(&mut page)).unwrap();
        assert!(body.contains(crate::embed::serve::CLIENT_JS_PATH));
        assert!(page.body.is_empty());
        assert_eq!(page.content_type(), "text/html");
    }

    #[test]
    fn test_encoded_and_non_html_pass_through() {
        let mut gzipped = upstream(
            &[("Content-Type", "text/html"), ("Content-Encoding", "gzip")],
            "<body></body>",
        );
        assert_eq!(page_body(&mut gzipped), b"<body></body>");

        let mut json = upstream(&[("Content-Type", "application/json")], "{}");
        assert_eq!(page_body(&mut json), b"{}");
    }
}
