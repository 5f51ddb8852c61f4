//! Unified error type for the bridge facade.

use pulsebridge_protocol::ProtocolError;
use pulsebridge_transport::{ConnState, TransportError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `pulsebridge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A send was attempted while the connection was not `Open`.
    #[error("bridge is not connected (state: {0})")]
    NotConnected(ConnState),

    /// A protocol-level error (encode, decode, invalid envelope).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport-level error (connect, send, receive, close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The bridge could not start its internal async runtime.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Send("gone".into());
        let bridge_err: BridgeError = err.into();
        assert!(matches!(bridge_err, BridgeError::Transport(_)));
        assert!(bridge_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidEnvelope("bad".into());
        let bridge_err: BridgeError = err.into();
        assert!(matches!(bridge_err, BridgeError::Protocol(_)));
    }

    #[test]
    fn test_not_connected_names_the_state() {
        let err = BridgeError::NotConnected(ConnState::Closing);
        assert!(err.to_string().contains("closing"));
    }
}
