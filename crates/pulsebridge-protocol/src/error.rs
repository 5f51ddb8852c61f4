//! Error types for the protocol layer.
//!
//! Each crate in Pulsebridge defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in envelope encoding or
//! decoding, not in the connection or the dispatch loop.

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event value into JSON).
    ///
    /// The inner `serde_json::Error` is the original error from serde.
    /// We wrap it so callers deal with `ProtocolError` uniformly.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning wire text back into an envelope).
    ///
    /// Common causes: malformed JSON, a missing `type` field, or
    /// truncated frames.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event value did not serialize to a usable payload.
    ///
    /// The primary case is a null payload; the bridge rejects it before
    /// any network call is attempted. Catalog events must serialize to a
    /// JSON object; the custom-event path additionally allows arrays and
    /// scalars but never null.
    #[error("payload for `{shape}` is {found}, expected a JSON object")]
    NotAnObject {
        /// The shape name (or custom event name) being encoded.
        shape: String,
        /// The JSON kind that was actually produced ("null", "array", ...).
        found: &'static str,
    },

    /// The envelope is structurally invalid at the protocol level.
    ///
    /// This is for input that passes JSON parsing but violates envelope
    /// rules, e.g. an empty `type` string.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}
