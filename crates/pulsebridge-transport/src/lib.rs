//! Transport abstraction layer for Pulsebridge.
//!
//! A [`Transport`] is one logical duplex connection to the remote
//! collector. It owns the connection state machine and translates every
//! asynchronous network happening (open, inbound frame, fault, close)
//! into a callback on the shared
//! [`ActionQueue`](pulsebridge_dispatch::ActionQueue), so consumer code
//! only ever observes transport events from the dispatch loop's `tick()`.
//!
//! # State machine
//!
//! ```text
//! Disconnected ─connect()→ Connecting ─handshake ok→ Open
//! Open ─close() | peer close | fatal fault→ Closing → Closed
//! ```
//!
//! `Closed` is terminal for that connection; a fresh `connect()` starts a
//! new connection generation. There is no implicit reconnect.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WsTransport;

use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Connection identity and state
// ---------------------------------------------------------------------------

/// Opaque identity for one connection generation.
///
/// Assigned per successful `connect()` call; `connect()` while already
/// connecting or connected is a no-op and does not mint a new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle state of a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No connection exists or has been attempted.
    Disconnected,
    /// A handshake is in flight.
    Connecting,
    /// The connection is established; sends are accepted.
    Open,
    /// An orderly close is in progress.
    Closing,
    /// The connection has ended. Terminal until a fresh `connect()`.
    Closed,
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Why a connection reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// This side requested the close.
    Local,
    /// The peer closed the connection.
    Remote,
    /// The connection ended abnormally (fault or close-handshake timeout).
    Error(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("closed locally"),
            Self::Remote => f.write_str("closed by peer"),
            Self::Error(e) => write!(f, "closed abnormally: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Events and frames
// ---------------------------------------------------------------------------

/// One happening on a connection, delivered through the action queue.
///
/// Ordering guarantee: events are enqueued in the order they occur on
/// the wire, and the single-threaded dispatch loop preserves that order.
/// Once a close has been requested, no further `Message`/`Error` events
/// are enqueued; `Closed` is always the last event of a generation.
#[derive(Debug)]
pub enum TransportEvent {
    /// The handshake completed; the connection is `Open`.
    Opened,
    /// An inbound text frame (binary frames are folded to UTF-8 text).
    Message(String),
    /// A transport-level fault. Does not itself change the connection
    /// state; the consumer decides whether to close.
    Error(TransportError),
    /// The connection reached `Closed`. Exactly one per generation.
    Closed(CloseReason),
}

/// Receives [`TransportEvent`]s from the transport's background tasks.
///
/// The transport never invokes the sink inline on a network task: each
/// event is wrapped as an action on the shared queue, and the sink runs
/// when the dispatch loop drains it.
pub type EventSink = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// An outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame (the envelope wire format).
    Text(String),
    /// A raw binary frame.
    Binary(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// A single client connection that can send frames and report events.
///
/// All three operations are fire-and-forget from the caller's
/// perspective: completion (or failure) is observed later through the
/// event sink on the dispatch thread. Only `send` reports the
/// synchronously-checkable precondition: the connection must be `Open`.
pub trait Transport: Send + Sync + 'static {
    /// Starts connecting to `url`. No-op if already `Connecting` or
    /// `Open` (idempotent). Raises `Opened` on success, `Error` on
    /// failure (state returns to `Disconnected`).
    fn connect(&self, url: &str);

    /// Queues a frame for sending without blocking.
    ///
    /// # Errors
    /// Returns [`TransportError::NotOpen`] if the state is not `Open`;
    /// asynchronous write faults surface later as `Error` events.
    fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Requests an orderly close. Always results in exactly one terminal
    /// `Closed` event, even if the close handshake itself fails.
    fn close(&self);

    /// The current lifecycle state.
    fn state(&self) -> ConnState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_conn_state_display() {
        assert_eq!(ConnState::Open.to_string(), "open");
        assert_eq!(ConnState::Disconnected.to_string(), "disconnected");
    }

    #[test]
    fn test_close_reason_display_carries_detail() {
        let reason = CloseReason::Error("timed out".into());
        assert!(reason.to_string().contains("timed out"));
        assert_eq!(CloseReason::Remote.to_string(), "closed by peer");
    }
}
