//! # Pulsebridge
//!
//! Typed event-ingestion bridge: push structured gameplay and telemetry
//! events from a host application to a remote collector over one
//! persistent WebSocket connection.
//!
//! Every event travels as a self-describing `{type, payload}` JSON
//! envelope. The `type` tag comes from the event's compile-time
//! [`EventShape`], so the catalog in [`pulsebridge_events`] needs no
//! registration step, and collectors can route on the tag alone.
//!
//! All observable outcomes (connection opened, closed, inbound
//! messages, faults) are queued and delivered on the host's own thread
//! when it calls [`Bridge::tick`], never from a background task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulsebridge::prelude::*;
//!
//! # fn main() -> Result<(), pulsebridge::BridgeError> {
//! let mut bridge = Bridge::new(
//!     BridgeConfig::new("ws://127.0.0.1:8765").with_auto_connect(true),
//! )?;
//! bridge.on_opened(|| println!("collector connected"));
//!
//! // In the host's main loop:
//! bridge.tick();
//! if bridge.is_connected() {
//!     bridge.send_event(&Score::new(50, 1050))?;
//! }
//! # Ok(())
//! # }
//! ```

mod bridge;
mod config;
mod error;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::BridgeError;

// Re-export the pieces callers need without extra dependency lines.
pub use pulsebridge_protocol::{Envelope, EventShape, ProtocolError};
pub use pulsebridge_transport::{
    CloseReason, ConnState, Frame, Transport, TransportError,
};

/// Everything a typical host needs, in one import.
pub mod prelude {
    pub use crate::{Bridge, BridgeConfig, BridgeError};
    pub use pulsebridge_events::{
        Achievement, AppLifecycle, CustomEvent, Emotion, ErrorReport,
        GamePhase, Interaction, LearningProgress, LevelComplete, LevelStart,
        LifecyclePhase, PlayerAction, SceneChange, Score, Vec3,
    };
    pub use pulsebridge_protocol::EventShape;
    pub use pulsebridge_transport::{CloseReason, ConnState};
}
