//! Proxy front-end with live reload support.
//!
//! ```text
//! browser --HTTP--> tiny_http (rayon pool) --reqwest--> backend
//!    ^                    |
//!    |         /__livesync/client.js
//!    +----WebSocket---- WsActor
//! ```

mod content;
mod lifecycle;
mod proxy;
mod response;

use crate::{config::SyncConfig, embed::serve::CLIENT_JS_PATH, log};
use anyhow::{Context, Result};
use crossbeam::channel;
use proxy::Proxy;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Default WebSocket port for live reload
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Worker threads of the request pool
const REQUEST_THREADS: usize = 4;

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by coordinator after WebSocket server binds successfully
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(DEFAULT_WS_PORT);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port
fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Run the proxy and the live reload actors until shutdown.
pub fn serve(config: Arc<SyncConfig>) -> Result<()> {
    set_actual_ws_port(config.serve.ws_port);

    let base = config
        .serve
        .proxy_url()
        .with_context(|| format!("invalid backend address `{}`", config.serve.proxy))?;
    let proxy = Arc::new(Proxy::new(base)?);

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{} -> {}", addr, proxy.base());

    let actors = lifecycle::spawn_actors(Arc::clone(&config), shutdown_rx)?;
    run_request_loop(&server, &proxy)?;
    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

fn run_request_loop(server: &Server, proxy: &Arc<Proxy>) -> Result<()> {
    // Use thread pool to handle requests concurrently
    // A slow backend response must not block other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("livesync-http-{i}"))
        .build()
        .context("failed to create request pool")?;

    for request in server.incoming_requests() {
        let proxy = Arc::clone(proxy);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &proxy) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, proxy: &Proxy) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    // Serve client.js from memory
    // Use actual ws_port which may differ from the configured one after retry
    if request.url() == CLIENT_JS_PATH {
        return response::respond_client_js(request, get_actual_ws_port());
    }

    match proxy.forward(&mut request) {
        Ok(upstream) => {
            crate::debug!("serve"; "{} {} -> {}", request.method(), request.url(), upstream.status);
            response::respond_upstream(request, upstream)
        }
        Err(e) => {
            log!("serve"; "{} {}: {:#}", request.method(), request.url(), e);
            response::respond_bad_gateway(request, &e)
        }
    }
}
