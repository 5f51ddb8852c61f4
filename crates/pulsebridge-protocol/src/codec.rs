//! Pure encode/decode between event values and wire text.
//!
//! The codec owns the envelope convention: it derives the `type` field
//! from the event's [`EventShape`] tag, validates the payload, and
//! produces/parses the UTF-8 text that travels on the wire. It performs
//! no I/O and holds no state.

use serde_json::Value;

use crate::{Envelope, EventShape, ProtocolError};

/// Encodes a catalog event into wire text.
///
/// The `type` field comes from `T::SHAPE`; the payload is the event's
/// field-by-field JSON serialization. Catalog events must serialize to
/// a JSON object; anything else (including null) is rejected here,
/// before any network call is attempted.
///
/// # Errors
///
/// - [`ProtocolError::Encode`] if serde fails to serialize the value.
/// - [`ProtocolError::NotAnObject`] if the value serializes to something
///   other than a JSON object.
///
/// ## Example
///
/// ```rust
/// use pulsebridge_protocol::{encode, EventShape};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Score { points: u32 }
/// impl EventShape for Score {
///     const SHAPE: &'static str = "Score";
/// }
///
/// let text = encode(&Score { points: 10 }).unwrap();
/// assert_eq!(text, r#"{"type":"Score","payload":{"points":10}}"#);
/// ```
pub fn encode<T: EventShape>(event: &T) -> Result<String, ProtocolError> {
    let payload = serde_json::to_value(event).map_err(ProtocolError::Encode)?;
    if !payload.is_object() {
        return Err(ProtocolError::NotAnObject {
            shape: T::SHAPE.to_string(),
            found: json_kind(&payload),
        });
    }
    let envelope = Envelope::new(T::SHAPE, payload);
    serde_json::to_string(&envelope).map_err(ProtocolError::Encode)
}

/// Encodes a custom event under a caller-supplied name.
///
/// This is the escape hatch for events outside the fixed catalog. The
/// payload is embedded as a plain JSON value, never re-serialized into
/// an escaped string inside the envelope, so custom events share one
/// encoding convention with catalog events. Any JSON value except null
/// is accepted (open schema).
///
/// # Errors
///
/// - [`ProtocolError::InvalidEnvelope`] if `name` is empty.
/// - [`ProtocolError::NotAnObject`] if `payload` is `Value::Null`.
pub fn encode_named(name: &str, payload: Value) -> Result<String, ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidEnvelope(
            "custom event name must be non-empty".into(),
        ));
    }
    if payload.is_null() {
        return Err(ProtocolError::NotAnObject {
            shape: name.to_string(),
            found: "null",
        });
    }
    let envelope = Envelope::new(name, payload);
    serde_json::to_string(&envelope).map_err(ProtocolError::Encode)
}

/// Parses wire text back into an [`Envelope`].
///
/// Only the inbound/custom paths need this; the primary bridge
/// direction is outbound. The payload is left as raw JSON for the
/// caller to interpret.
///
/// # Errors
///
/// - [`ProtocolError::Decode`] on malformed JSON or a missing field.
/// - [`ProtocolError::InvalidEnvelope`] if the `type` field is empty.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(ProtocolError::Decode)?;
    if envelope.kind.is_empty() {
        return Err(ProtocolError::InvalidEnvelope(
            "`type` field must be non-empty".into(),
        ));
    }
    Ok(envelope)
}

/// Human-readable name of a JSON value's kind, for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LevelComplete {
        level_name: String,
        time_taken: f64,
        score: i64,
        perfect_clear: bool,
    }

    impl EventShape for LevelComplete {
        const SHAPE: &'static str = "LevelComplete";
    }

    /// An event that serializes to a bare string, the Rust analogue of
    /// handing the codec something that is not an object.
    #[derive(Serialize)]
    #[serde(transparent)]
    struct BareString(String);

    impl EventShape for BareString {
        const SHAPE: &'static str = "BareString";
    }

    fn tutorial_clear() -> LevelComplete {
        LevelComplete {
            level_name: "Tutorial".into(),
            time_taken: 45.5,
            score: 1000,
            perfect_clear: true,
        }
    }

    // =====================================================================
    // encode
    // =====================================================================

    #[test]
    fn test_encode_produces_type_and_camel_case_payload() {
        // The concrete wire scenario: all key/value pairs present and
        // correctly typed (field order is free, so compare as values).
        let text = encode(&tutorial_clear()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["type"], "LevelComplete");
        assert_eq!(json["payload"]["levelName"], "Tutorial");
        assert_eq!(json["payload"]["timeTaken"], 45.5);
        assert_eq!(json["payload"]["score"], 1000);
        assert_eq!(json["payload"]["perfectClear"], true);
    }

    #[test]
    fn test_encode_rejects_non_object_event() {
        let err = encode(&BareString("oops".into())).unwrap_err();
        match err {
            ProtocolError::NotAnObject { shape, found } => {
                assert_eq!(shape, "BareString");
                assert_eq!(found, "a string");
            }
            other => panic!("expected NotAnObject, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_decode_round_trip_preserves_shape_and_fields() {
        let event = tutorial_clear();
        let envelope = decode(&encode(&event).unwrap()).unwrap();

        assert_eq!(envelope.kind, event.shape_name());
        let back: LevelComplete =
            serde_json::from_value(envelope.payload).unwrap();
        assert_eq!(back, event);
    }

    // =====================================================================
    // encode_named (custom-event path)
    // =====================================================================

    #[test]
    fn test_encode_named_embeds_payload_as_plain_json() {
        // The payload must appear as a JSON value, not as an escaped
        // string-within-a-string.
        let text = encode_named(
            "BossDefeated",
            serde_json::json!({ "bossName": "Molduga", "attempts": 3 }),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["type"], "BossDefeated");
        assert!(json["payload"].is_object());
        assert_eq!(json["payload"]["attempts"], 3);
    }

    #[test]
    fn test_encode_named_allows_non_object_payloads() {
        // Custom events have an open schema: arrays and scalars pass.
        let text =
            encode_named("HighScores", serde_json::json!([100, 90, 80])).unwrap();
        let envelope = decode(&text).unwrap();
        assert_eq!(envelope.payload, serde_json::json!([100, 90, 80]));
    }

    #[test]
    fn test_encode_named_rejects_null_payload() {
        let err =
            encode_named("Nothing", serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnObject { .. }));
    }

    #[test]
    fn test_encode_named_rejects_empty_name() {
        let err = encode_named("", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEnvelope(_)));
    }

    // =====================================================================
    // decode
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let err = decode("not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_missing_type_returns_decode_error() {
        let err = decode(r#"{"payload": {"x": 1}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_empty_type_returns_invalid_envelope() {
        let err = decode(r#"{"type": "", "payload": {}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_decode_preserves_payload_verbatim() {
        let envelope = decode(
            r#"{"type":"PlayerAction","payload":{"action":"jump","position":{"x":1.0,"y":2.0,"z":3.0}}}"#,
        )
        .unwrap();
        assert_eq!(envelope.kind, "PlayerAction");
        assert_eq!(envelope.payload["position"]["y"], 2.0);
    }
}
