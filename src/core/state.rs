//! Process-wide shutdown state.
//!
//! Ctrl+C before `serve` is up exits right away. Once the proxy has
//! registered itself, Ctrl+C unblocks its request loop and signals the
//! actor system instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

static SERVE: OnceLock<ServeHandles> = OnceLock::new();

/// What a running `serve` needs to be told about shutdown.
struct ServeHandles {
    server: Arc<Server>,
    actors: Sender<()>,
}

/// Install the Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SERVE.get().is_none() {
            std::process::exit(0);
        }
        crate::log!("serve"; "shutting down...");
        request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the bound proxy server and the actor shutdown channel.
///
/// Only the first registration counts.
pub fn register_server(server: Arc<Server>, actors: Sender<()>) {
    let _ = SERVE.set(ServeHandles { server, actors });
}

/// Flag shutdown, signal the actors and unblock the request loop.
///
/// Safe to call more than once and from any thread.
pub fn request_shutdown() {
    if SHUTDOWN.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Some(handles) = SERVE.get() {
        let _ = handles.actors.send(());
        handles.server.unblock();
    }
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
