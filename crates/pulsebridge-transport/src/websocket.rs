//! Client WebSocket transport using `tokio-tungstenite`.
//!
//! One [`WsTransport`] handle manages one connection generation at a
//! time. `connect()` spawns the handshake on the provided runtime
//! handle; once open, a writer task drains the outbound command channel
//! (so `send()` never blocks) and the receive loop turns every inbound
//! frame into a queued callback for the dispatch thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use pulsebridge_dispatch::ActionQueue;

use crate::{
    CloseReason, ConnState, ConnectionId, EventSink, Frame, Transport,
    TransportError, TransportEvent,
};

/// Counter for generating unique connection-generation IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long an orderly close may take before the connection is forced
/// to `Closed` with an error reason.
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands consumed by the writer task.
enum WriteCmd {
    Frame(Message),
    Close,
}

/// State shared between the handle and the background tasks.
struct Shared {
    state: Mutex<ConnState>,
    queue: ActionQueue,
    sink: EventSink,
}

impl Shared {
    fn state(&self) -> ConnState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: ConnState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Wraps the event as an action on the queue, never invoked inline
    /// on a network task, always delivered from `tick()`.
    fn emit(&self, event: TransportEvent) {
        let sink = Arc::clone(&self.sink);
        self.queue.push(move || sink(event));
    }
}

/// Per-generation connection state.
struct Conn {
    id: ConnectionId,
    writer: mpsc::UnboundedSender<WriteCmd>,
    /// Set when a close has been requested; gates further inbound events.
    closing: Arc<AtomicBool>,
    /// Set when the terminal `Closed` event has been emitted.
    closed: Arc<AtomicBool>,
}

/// A WebSocket-based client [`Transport`].
pub struct WsTransport {
    handle: Handle,
    shared: Arc<Shared>,
    conn: Mutex<Option<Conn>>,
    close_timeout: Duration,
}

impl WsTransport {
    /// Creates a transport that spawns its background tasks on `handle`,
    /// enqueues events on `queue`, and delivers them to `sink`.
    pub fn new(handle: Handle, queue: ActionQueue, sink: EventSink) -> Self {
        Self {
            handle,
            shared: Arc::new(Shared {
                state: Mutex::new(ConnState::Disconnected),
                queue,
                sink,
            }),
            conn: Mutex::new(None),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    /// Overrides the close-handshake watchdog timeout.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

impl Transport for WsTransport {
    fn connect(&self, url: &str) {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        match self.shared.state() {
            ConnState::Connecting | ConnState::Open => {
                tracing::debug!(url, "connect ignored, already active");
                return;
            }
            ConnState::Closing => {
                tracing::debug!(url, "connect ignored, close in progress");
                return;
            }
            ConnState::Disconnected | ConnState::Closed => {}
        }

        self.shared.set_state(ConnState::Connecting);
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (writer, cmd_rx) = mpsc::unbounded_channel();
        let closing = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));
        *conn = Some(Conn {
            id,
            writer,
            closing: Arc::clone(&closing),
            closed: Arc::clone(&closed),
        });

        tracing::debug!(%id, url, "connecting");
        self.handle.spawn(run_connection(
            Arc::clone(&self.shared),
            id,
            url.to_string(),
            cmd_rx,
            closing,
            closed,
        ));
    }

    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let state = self.shared.state();
        if state != ConnState::Open {
            return Err(TransportError::NotOpen(state));
        }
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let Some(conn) = conn.as_ref() else {
            return Err(TransportError::NotOpen(state));
        };
        let msg = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data.into()),
        };
        conn.writer
            .send(WriteCmd::Frame(msg))
            .map_err(|_| TransportError::Send("write channel closed".into()))
    }

    fn close(&self) {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let Some(conn) = conn.as_ref() else {
            return;
        };
        if !matches!(
            self.shared.state(),
            ConnState::Connecting | ConnState::Open
        ) {
            return;
        }
        if conn.closing.swap(true, Ordering::SeqCst) {
            return; // close already in progress
        }

        self.shared.set_state(ConnState::Closing);
        tracing::debug!(id = %conn.id, "close requested");
        let _ = conn.writer.send(WriteCmd::Close);

        // Watchdog: the close handshake must never hang. If the peer
        // fails to complete it in time, the generation is forced to
        // Closed with an error reason, still exactly one Closed event.
        let shared = Arc::clone(&self.shared);
        let closed = Arc::clone(&conn.closed);
        let timeout = self.close_timeout;
        self.handle.spawn(async move {
            tokio::time::sleep(timeout).await;
            finish_close(
                &shared,
                &closed,
                CloseReason::Error("close handshake timed out".into()),
            );
        });
    }

    fn state(&self) -> ConnState {
        self.shared.state()
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        // Best-effort orderly close. The writer task sends the Close
        // frame if the connection is still alive; no watchdog is spawned
        // since nobody remains to observe the event.
        if let Ok(conn) = self.conn.lock() {
            if let Some(conn) = conn.as_ref() {
                conn.closing.store(true, Ordering::SeqCst);
                let _ = conn.writer.send(WriteCmd::Close);
            }
        }
    }
}

/// Transitions a generation to `Closed` and emits the terminal event.
/// Gated by the generation's `closed` flag: at most one `Closed` per
/// generation no matter how many paths race here (read loop, watchdog,
/// peer close).
fn finish_close(shared: &Arc<Shared>, closed: &AtomicBool, reason: CloseReason) {
    if closed.swap(true, Ordering::SeqCst) {
        return;
    }
    shared.set_state(ConnState::Closed);
    tracing::debug!(%reason, "connection closed");
    shared.emit(TransportEvent::Closed(reason));
}

/// Drives one connection generation from handshake to close.
async fn run_connection(
    shared: Arc<Shared>,
    id: ConnectionId,
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<WriteCmd>,
    closing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
) {
    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::debug!(%id, error = %e, "handshake failed");
            shared.set_state(ConnState::Disconnected);
            shared.emit(TransportEvent::Error(TransportError::Connect(
                e.to_string(),
            )));
            return;
        }
    };

    if closing.load(Ordering::SeqCst) {
        // close() raced the handshake; end the generation immediately.
        finish_close(&shared, &closed, CloseReason::Local);
        return;
    }

    shared.set_state(ConnState::Open);
    shared.emit(TransportEvent::Opened);
    tracing::debug!(%id, "connection open");

    let (mut ws_sink, mut ws_stream) = ws.split();

    // Writer task: drains the command channel so send() never blocks the
    // caller. A Close command sends the close frame and stops writing;
    // the receive loop below observes the handshake completing.
    let write_shared = Arc::clone(&shared);
    let write_closing = Arc::clone(&closing);
    let writer = tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                WriteCmd::Frame(msg) => {
                    if let Err(e) = ws_sink.send(msg).await {
                        if !write_closing.load(Ordering::SeqCst) {
                            write_shared.emit(TransportEvent::Error(
                                TransportError::Send(e.to_string()),
                            ));
                        }
                    }
                }
                WriteCmd::Close => {
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Receive loop: each inbound frame becomes a queued callback, in
    // wire arrival order. After a close is requested, inbound frames
    // and faults are dropped so Closed is the last event observed.
    let mut fault: Option<String> = None;
    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if !closing.load(Ordering::SeqCst) {
                    shared.emit(TransportEvent::Message(
                        text.as_str().to_owned(),
                    ));
                }
            }
            Ok(Message::Binary(data)) => {
                // Binary frames are folded to text, mirroring the text
                // fold on the send side of the envelope convention.
                if !closing.load(Ordering::SeqCst) {
                    shared.emit(TransportEvent::Message(
                        String::from_utf8_lossy(&data).into_owned(),
                    ));
                }
            }
            Ok(Message::Close(_)) => {
                let reason = if closing.load(Ordering::SeqCst) {
                    CloseReason::Local
                } else {
                    CloseReason::Remote
                };
                finish_close(&shared, &closed, reason);
                break;
            }
            Ok(_) => {} // ping/pong/raw frames handled by tungstenite
            Err(e) => {
                // A fault surfaces as an error event without forcing a
                // state change; if the stream dies because of it, the
                // terminal Closed below carries it as the reason.
                if !closing.load(Ordering::SeqCst) {
                    shared.emit(TransportEvent::Error(
                        TransportError::Receive(e.to_string()),
                    ));
                }
                fault = Some(e.to_string());
            }
        }
    }

    let reason = if closing.load(Ordering::SeqCst) {
        CloseReason::Local
    } else if let Some(e) = fault {
        CloseReason::Error(e)
    } else {
        CloseReason::Remote
    };
    finish_close(&shared, &closed, reason);
    writer.abort();
    tracing::debug!(%id, "receive loop exited");
}
