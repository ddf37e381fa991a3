//! WebSocket Server for Live Reload
//!
//! Accepts browser connections and hands each raw stream to the WsActor,
//! which performs the handshake and registers the client.

use std::net::{IpAddr, TcpListener};
use std::time::Duration;

use anyhow::Result;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the non-blocking accept loop
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Start the WebSocket acceptor. Returns the port actually bound.
///
/// Streams are sent to the WsActor as `WsMsg::AddClient`. The acceptor
/// thread exits when shutdown is requested or the actor is gone.
pub fn start_ws_server_with_channel(
    interface: IpAddr,
    base_port: u16,
    ws_tx: tokio::sync::mpsc::Sender<WsMsg>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::Builder::new()
        .name("livesync-ws-accept".into())
        .spawn(move || accept_loop(listener, ws_tx))?;

    Ok(actual_port)
}

fn accept_loop(listener: TcpListener, ws_tx: tokio::sync::mpsc::Sender<WsMsg>) {
    while !crate::core::is_shutdown() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("ws"; "connection from {}", addr);

                // Blocking mode for the handshake
                let _ = stream.set_nonblocking(false);

                if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                    crate::debug!("ws"; "actor stopped, acceptor exiting");
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                crate::log!("ws"; "accept error: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
