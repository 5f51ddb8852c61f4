//! Built-in catalog of trackable event shapes.
//!
//! Each entry is a fixed-shape record with no behavior beyond
//! construction: plain fields, a `new` constructor for the required
//! ones, and `with_*` builders for the optional ones. The record's
//! [`EventShape`] tag determines the wire `type`, and serde's camelCase
//! renaming determines the payload keys, so
//! `LevelComplete::new("Tutorial", 45.5, 1000, true)` travels as:
//!
//! ```text
//! {"type":"LevelComplete","payload":{"levelName":"Tutorial","timeTaken":45.5,"score":1000,"perfectClear":true}}
//! ```
//!
//! Shapes that carry a timestamp stamp it at construction time (local
//! time, `YYYY-MM-DD HH:MM:SS`); the codec never touches clocks.
//!
//! For anything not covered here, [`CustomEvent`] pairs a caller-chosen
//! name with an arbitrary JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pulsebridge_protocol::EventShape;

/// Formats the current local time as `YYYY-MM-DD HH:MM:SS`.
///
/// Called by the event constructors, at send time from the caller's
/// point of view.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Shared aggregate types
// ---------------------------------------------------------------------------

/// A 3-component position, serialized as `{"x":_,"y":_,"z":_}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Application lifecycle transitions reported by [`AppLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    Started,
    Paused,
    Resumed,
    Quit,
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// The player entered a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStart {
    pub level_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_number: Option<u32>,
}

impl LevelStart {
    pub fn new(level_name: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            level_number: None,
        }
    }

    #[must_use]
    pub fn with_level_number(mut self, level_number: u32) -> Self {
        self.level_number = Some(level_number);
        self
    }
}

impl EventShape for LevelStart {
    const SHAPE: &'static str = "LevelStart";
}

/// The player finished a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelComplete {
    pub level_name: String,
    /// Seconds spent in the level.
    pub time_taken: f64,
    pub score: i64,
    pub perfect_clear: bool,
}

impl LevelComplete {
    pub fn new(
        level_name: impl Into<String>,
        time_taken: f64,
        score: i64,
        perfect_clear: bool,
    ) -> Self {
        Self {
            level_name: level_name.into(),
            time_taken,
            score,
            perfect_clear,
        }
    }
}

impl EventShape for LevelComplete {
    const SHAPE: &'static str = "LevelComplete";
}

/// A discrete player action (jump, attack, open...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

impl PlayerAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            context: None,
            position: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }
}

impl EventShape for PlayerAction {
    const SHAPE: &'static str = "PlayerAction";
}

/// Points were awarded (or deducted; `points` may be negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub points: i64,
    /// Running total after this award.
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Score {
    pub fn new(points: i64, total: i64) -> Self {
        Self {
            points,
            total,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl EventShape for Score {
    const SHAPE: &'static str = "Score";
}

/// An achievement was unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub achievement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_name: Option<String>,
}

impl Achievement {
    pub fn new(achievement_id: impl Into<String>) -> Self {
        Self {
            achievement_id: achievement_id.into(),
            achievement_name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.achievement_name = Some(name.into());
        self
    }
}

impl EventShape for Achievement {
    const SHAPE: &'static str = "Achievement";
}

/// The player interacted with a world object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub object_name: String,
    pub interaction_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

impl Interaction {
    pub fn new(
        object_name: impl Into<String>,
        interaction_type: impl Into<String>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            interaction_type: interaction_type.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }
}

impl EventShape for Interaction {
    const SHAPE: &'static str = "Interaction";
}

/// An inferred or reported player emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emotion {
    pub emotion: String,
    /// Strength in `0.0..=1.0`. Not clamped; the collector decides.
    pub intensity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl Emotion {
    pub fn new(emotion: impl Into<String>, intensity: f32) -> Self {
        Self {
            emotion: emotion.into(),
            intensity,
            trigger: None,
        }
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }
}

impl EventShape for Emotion {
    const SHAPE: &'static str = "Emotion";
}

/// Progress on a learning objective, stamped at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProgress {
    pub subject: String,
    pub skill: String,
    /// Completion in `0.0..=1.0`.
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    pub timestamp: String,
}

impl LearningProgress {
    pub fn new(
        subject: impl Into<String>,
        skill: impl Into<String>,
        progress: f32,
    ) -> Self {
        Self {
            subject: subject.into(),
            skill: skill.into(),
            progress,
            correct: None,
            timestamp: timestamp_now(),
        }
    }

    #[must_use]
    pub fn with_correct(mut self, correct: bool) -> Self {
        self.correct = Some(correct);
        self
    }
}

impl EventShape for LearningProgress {
    const SHAPE: &'static str = "LearningProgress";
}

/// The game moved to a new phase (lobby, playing, results...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePhase {
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_phase: Option<String>,
}

impl GamePhase {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            previous_phase: None,
        }
    }

    #[must_use]
    pub fn with_previous_phase(mut self, previous: impl Into<String>) -> Self {
        self.previous_phase = Some(previous.into());
        self
    }
}

impl EventShape for GamePhase {
    const SHAPE: &'static str = "GamePhase";
}

/// A scene/level load transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneChange {
    pub from_scene: String,
    pub to_scene: String,
}

impl SceneChange {
    pub fn new(
        from_scene: impl Into<String>,
        to_scene: impl Into<String>,
    ) -> Self {
        Self {
            from_scene: from_scene.into(),
            to_scene: to_scene.into(),
        }
    }
}

impl EventShape for SceneChange {
    const SHAPE: &'static str = "SceneChange";
}

/// The host application changed lifecycle phase, stamped at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLifecycle {
    pub phase: LifecyclePhase,
    pub timestamp: String,
}

impl AppLifecycle {
    pub fn new(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            timestamp: timestamp_now(),
        }
    }
}

impl EventShape for AppLifecycle {
    const SHAPE: &'static str = "AppLifecycle";
}

/// An application-level error report, stamped at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub timestamp: String,
}

impl ErrorReport {
    pub fn new(
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            context: None,
            timestamp: timestamp_now(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl EventShape for ErrorReport {
    const SHAPE: &'static str = "ErrorReport";
}

// ---------------------------------------------------------------------------
// Custom events
// ---------------------------------------------------------------------------

/// An event outside the fixed catalog: a caller-chosen name plus an
/// arbitrary JSON payload.
///
/// The payload rides in the envelope as a plain JSON value, encoded the
/// same way as every catalog event; there is no string-within-a-string
/// double encoding on the custom path.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    /// The wire `type` discriminator. Must be non-empty.
    pub name: String,
    /// Any JSON value except null.
    pub payload: Value,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebridge_protocol::encode;

    #[test]
    fn test_level_complete_wire_scenario() {
        // The reference scenario, end to end through the codec.
        let event = LevelComplete::new("Tutorial", 45.5, 1000, true);
        let text = encode(&event).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["type"], "LevelComplete");
        let payload = &json["payload"];
        assert_eq!(payload["levelName"], "Tutorial");
        assert_eq!(payload["timeTaken"], 45.5);
        assert_eq!(payload["score"], 1000);
        assert_eq!(payload["perfectClear"], true);
        assert_eq!(payload.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_shape_names_are_pascal_case_type_names() {
        assert_eq!(LevelStart::SHAPE, "LevelStart");
        assert_eq!(LevelComplete::SHAPE, "LevelComplete");
        assert_eq!(PlayerAction::SHAPE, "PlayerAction");
        assert_eq!(Score::SHAPE, "Score");
        assert_eq!(Achievement::SHAPE, "Achievement");
        assert_eq!(Interaction::SHAPE, "Interaction");
        assert_eq!(Emotion::SHAPE, "Emotion");
        assert_eq!(LearningProgress::SHAPE, "LearningProgress");
        assert_eq!(GamePhase::SHAPE, "GamePhase");
        assert_eq!(SceneChange::SHAPE, "SceneChange");
        assert_eq!(AppLifecycle::SHAPE, "AppLifecycle");
        assert_eq!(ErrorReport::SHAPE, "ErrorReport");
    }

    #[test]
    fn test_vec3_serializes_as_xyz_object() {
        let json =
            serde_json::to_value(Vec3::new(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.5, "z": -3.0 }));
    }

    #[test]
    fn test_optional_fields_are_omitted_when_unset() {
        let json = serde_json::to_value(PlayerAction::new("jump")).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "jump" }));

        let json = serde_json::to_value(
            PlayerAction::new("jump")
                .with_context("tutorial")
                .with_position(Vec3::new(0.0, 1.0, 0.0)),
        )
        .unwrap();
        assert_eq!(json["context"], "tutorial");
        assert_eq!(json["position"]["y"], 1.0);
    }

    #[test]
    fn test_round_trip_with_omitted_optionals() {
        let event = Score::new(50, 1050);
        let text = serde_json::to_string(&event).unwrap();
        let back: Score = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_lifecycle_phase_serializes_lowercase() {
        let json =
            serde_json::to_value(AppLifecycle::new(LifecyclePhase::Paused))
                .unwrap();
        assert_eq!(json["phase"], "paused");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        // YYYY-MM-DD HH:MM:SS
        assert_eq!(ts.len(), 19);
        let bytes = ts.as_bytes();
        assert_eq!(bytes[4], b'-');
        assert_eq!(bytes[7], b'-');
        assert_eq!(bytes[10], b' ');
        assert_eq!(bytes[13], b':');
        assert_eq!(bytes[16], b':');
        assert!(ts.chars().filter(|c| c.is_ascii_digit()).count() == 14);
    }

    #[test]
    fn test_timestamp_bearing_shapes_stamp_at_construction() {
        let report = ErrorReport::new("NullReference", "boom");
        assert_eq!(report.timestamp.len(), 19);
        let progress = LearningProgress::new("math", "fractions", 0.75);
        assert_eq!(progress.timestamp.len(), 19);
    }

    #[test]
    fn test_custom_event_holds_name_and_payload() {
        let event = CustomEvent::new(
            "BossDefeated",
            serde_json::json!({ "attempts": 3 }),
        );
        assert_eq!(event.name, "BossDefeated");
        assert_eq!(event.payload["attempts"], 3);
    }
}
