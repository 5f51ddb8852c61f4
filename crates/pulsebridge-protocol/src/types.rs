//! Core protocol types for Pulsebridge's wire format.
//!
//! Every frame on the wire is one [`Envelope`]: a `type` string that
//! names the event's shape, and a `payload` carrying the event's fields
//! as plain JSON. The envelope is immutable once built: it is produced,
//! serialized, and discarded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// EventShape: the compile-time type tag
// ---------------------------------------------------------------------------

/// A value that can travel inside an envelope, tagged by its shape name.
///
/// The wire `type` discriminator is derived from the event's *declared*
/// shape, not discovered at runtime: every event type carries an
/// associated `SHAPE` constant that the codec reads at compile time.
/// You cannot construct an envelope for a catalog event with the wrong
/// tag, and there is no runtime reflection anywhere.
///
/// ## Example
///
/// ```rust
/// use pulsebridge_protocol::EventShape;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct CoinPickup {
///     coin_value: u32,
/// }
///
/// impl EventShape for CoinPickup {
///     const SHAPE: &'static str = "CoinPickup";
/// }
///
/// assert_eq!(CoinPickup { coin_value: 5 }.shape_name(), "CoinPickup");
/// ```
pub trait EventShape: Serialize {
    /// The wire discriminator for this event kind. Must be non-empty.
    /// PascalCase by convention, but the codec imposes no casing rule.
    const SHAPE: &'static str;

    /// The shape name of this value. Provided; rarely overridden.
    fn shape_name(&self) -> &'static str {
        Self::SHAPE
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The `{type, payload}` wrapper around any event value.
///
/// ```text
/// ┌──────────────────────────────────────┐
/// │ type: "LevelComplete"                │  ← shape discriminator
/// │ ┌──────────────────────────────────┐ │
/// │ │ payload: {"levelName":"Tutorial",│ │  ← the event's fields
/// │ │           "score":1000, ...}     │ │
/// │ └──────────────────────────────────┘ │
/// └──────────────────────────────────────┘
/// ```
///
/// Field insertion order inside `payload` is not guaranteed and carries
/// no meaning to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The event's logical kind. Invariant: non-empty. Enforced by the
    /// codec on both the encode and decode paths.
    #[serde(rename = "type")]
    pub kind: String,

    /// The event's fields as an open-schema JSON value.
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope from raw parts. The codec functions are the
    /// usual entry points; this exists for tests and pre-validated input.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
