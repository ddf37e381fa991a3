//! Per-connection I/O.
//!
//! Each browser gets one thread that owns its socket. The thread performs
//! the handshake, registers the client, then alternates between draining
//! the client's outbox and polling the socket for acks and close frames.
//! Only this thread writes to the socket, so outbox order is wire order.

use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::reload::message::ClientMessage;
use crate::reload::registry::{ClientHandle, ClientRegistry};

/// How long the outbox is waited on before the socket is polled.
const POLL: Duration = Duration::from_millis(50);

/// Liveness settings (`[client]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// Ping period
    pub interval: Duration,
    /// Silence after which a client is dropped
    pub timeout: Duration,
}

/// Why a connection loop ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    /// Unregistered by the dispatcher, reaper, or shutdown
    Closed,
    /// Browser went away
    Gone,
}

pub(super) fn spawn_connection(
    stream: TcpStream,
    registry: Arc<ClientRegistry>,
    heartbeat: Heartbeat,
) {
    let spawned = std::thread::Builder::new()
        .name("livesync-client".into())
        .spawn(move || serve_connection(stream, &registry, heartbeat));
    if let Err(e) = spawned {
        crate::log!("ws"; "failed to spawn connection thread: {}", e);
    }
}

fn serve_connection(stream: TcpStream, registry: &ClientRegistry, heartbeat: Heartbeat) {
    // Blocking mode during handshake, switch to non-blocking after
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("ws"; "handshake failed: {}", e);
            return;
        }
    };
    let _ = ws.get_ref().set_nonblocking(true);

    if send(&mut ws, &ClientMessage::connected()).is_err() {
        crate::debug!("ws"; "client left during handshake");
        return;
    }

    let (handle, outbox) = ClientHandle::with_outbox(registry.next_id());
    if !registry.register(handle.clone()) {
        return;
    }

    let exit = connection_loop(&mut ws, &handle, &outbox, heartbeat.interval);
    match exit {
        Exit::Closed => {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        Exit::Gone => {
            registry.unregister(handle.id);
        }
    }
    crate::debug!(
        "ws"; "{} connection ended after {:.1?} ({:?})",
        handle.id,
        handle.connected_at.elapsed(),
        exit
    );
}

fn connection_loop(
    ws: &mut WebSocket<TcpStream>,
    handle: &ClientHandle,
    outbox: &Receiver<ClientMessage>,
    heartbeat: Duration,
) -> Exit {
    let mut last_ping = Instant::now();

    loop {
        if handle.is_closed() {
            return Exit::Closed;
        }

        match outbox.recv_timeout(POLL) {
            Ok(message) => {
                if send(ws, &message).is_err() {
                    return Exit::Gone;
                }
                // Drain the rest without waiting
                while let Ok(message) = outbox.try_recv() {
                    if send(ws, &message).is_err() {
                        return Exit::Gone;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // Registry dropped the last sender
            Err(RecvTimeoutError::Disconnected) => return Exit::Closed,
        }

        if last_ping.elapsed() >= heartbeat {
            last_ping = Instant::now();
            if write(ws, Message::Ping(Default::default())).is_err() {
                return Exit::Gone;
            }
        }

        // Frames left buffered by a blocked write go out here
        if flush(ws).is_err() {
            return Exit::Gone;
        }

        if let Some(exit) = poll_reads(ws, handle) {
            return exit;
        }
    }
}

/// Drain readable frames. `Some` ends the connection.
fn poll_reads(ws: &mut WebSocket<TcpStream>, handle: &ClientHandle) -> Option<Exit> {
    loop {
        match ws.read() {
            Ok(Message::Pong(_)) | Ok(Message::Text(_)) => handle.acknowledge(),
            Ok(Message::Close(_)) => return Some(Exit::Gone),
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if is_would_block(e) => return None,
            Err(_) => return Some(Exit::Gone),
        }
    }
}

fn send(ws: &mut WebSocket<TcpStream>, message: &ClientMessage) -> Result<(), tungstenite::Error> {
    write(ws, Message::Text(message.to_json().into()))
}

fn write(ws: &mut WebSocket<TcpStream>, message: Message) -> Result<(), tungstenite::Error> {
    match ws.send(message) {
        // Frame is buffered; the next write or flush sends it
        Err(tungstenite::Error::Io(ref e)) if is_would_block(e) => Ok(()),
        other => other,
    }
}

fn flush(ws: &mut WebSocket<TcpStream>) -> Result<(), tungstenite::Error> {
    match ws.flush() {
        Err(tungstenite::Error::Io(ref e)) if is_would_block(e) => Ok(()),
        other => other,
    }
}

fn is_would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    type ClientSocket = WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>;

    fn connect(registry: Arc<ClientRegistry>) -> ClientSocket {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve_connection(
                stream,
                &registry,
                Heartbeat {
                    interval: Duration::from_secs(5),
                    timeout: Duration::from_secs(15),
                },
            );
        });
        let (ws, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
        ws
    }

    fn read_message(ws: &mut ClientSocket) -> ClientMessage {
        loop {
            if let Message::Text(text) = ws.read().unwrap() {
                return ClientMessage::from_json(&text).unwrap();
            }
        }
    }

    fn wait_until(cond: impl Fn() -> bool) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_connect_receive_and_disconnect() {
        let registry = Arc::new(ClientRegistry::new());
        let mut ws = connect(Arc::clone(&registry));

        assert!(matches!(read_message(&mut ws), ClientMessage::Connected { .. }));
        wait_until(|| registry.len() == 1);

        let client = registry.active_clients().remove(0);
        client.deliver(ClientMessage::Full).unwrap();
        client
            .deliver(ClientMessage::Scoped {
                scope: "*.css".into(),
            })
            .unwrap();
        assert_eq!(read_message(&mut ws), ClientMessage::Full);
        assert_eq!(
            read_message(&mut ws),
            ClientMessage::Scoped {
                scope: "*.css".into()
            }
        );

        ws.close(None).unwrap();
        let _ = ws.flush();
        wait_until(|| registry.is_empty());
    }

    #[test]
    fn test_oversized_message_delivered_without_followup() {
        let registry = Arc::new(ClientRegistry::new());
        let mut ws = connect(Arc::clone(&registry));
        read_message(&mut ws);
        wait_until(|| registry.len() == 1);

        // Larger than the socket buffer, so the first write blocks part way
        let text = "x".repeat(8 * 1024 * 1024);
        let client = registry.active_clients().remove(0);
        client.deliver(ClientMessage::notice(&text)).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(read_message(&mut ws), ClientMessage::notice(&text));
    }

    #[test]
    fn test_unregister_closes_socket() {
        let registry = Arc::new(ClientRegistry::new());
        let mut ws = connect(Arc::clone(&registry));
        read_message(&mut ws);
        wait_until(|| registry.len() == 1);

        registry.close_all();

        // Server sends a close frame
        let closed = loop {
            match ws.read() {
                Ok(Message::Close(_)) | Err(_) => break true,
                Ok(_) => continue,
            }
        };
        assert!(closed);
    }
}
