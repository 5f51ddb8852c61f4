use crate::ConnState;

/// Errors that can occur in the transport layer.
///
/// Variants carry descriptive strings rather than source errors because
/// they travel inside [`TransportEvent`](crate::TransportEvent)s across
/// thread boundaries; the transport never lets a network fault unwind
/// into consumer code.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The handshake failed (DNS, TCP, TLS, or WebSocket upgrade).
    #[error("connect failed: {0}")]
    Connect(String),

    /// A send was attempted while the connection was not `Open`.
    #[error("connection is {0}, not open")]
    NotOpen(ConnState),

    /// An underlying write fault.
    #[error("send failed: {0}")]
    Send(String),

    /// An underlying read fault.
    #[error("receive failed: {0}")]
    Receive(String),
}
