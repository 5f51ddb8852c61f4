//! Reports a short scripted play session to a collector.
//!
//! Run a collector (any WebSocket echo/logging server works), then:
//!
//! ```text
//! cargo run -p score-reporter -- ws://127.0.0.1:8765
//! ```

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use pulsebridge::prelude::*;
use tracing_subscriber::EnvFilter;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8765".to_string());

    match run(&url) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "session failed");
            ExitCode::FAILURE
        }
    }
}

fn run(url: &str) -> Result<(), BridgeError> {
    let mut bridge = Bridge::new(BridgeConfig::new(url).with_debug(true))?;

    bridge.on_opened(|| tracing::info!("collector connected"));
    bridge.on_closed(|reason| tracing::info!(%reason, "disconnected"));
    bridge.on_message(|text| tracing::info!(%text, "collector says"));
    bridge.on_error(|err| tracing::warn!(error = %err, "bridge error"));

    bridge.connect();
    let deadline = Instant::now() + CONNECT_TIMEOUT;
    while !bridge.is_connected() {
        if Instant::now() > deadline {
            tracing::error!(url, "could not reach the collector");
            return Ok(());
        }
        bridge.tick();
        thread::sleep(Duration::from_millis(20));
    }
    bridge.tick();

    // A little scripted session.
    bridge.send_event(&AppLifecycle::new(LifecyclePhase::Started))?;
    bridge.send_event(&LevelStart::new("Tutorial").with_level_number(1))?;
    bridge.send_event(
        &PlayerAction::new("jump")
            .with_context("first platform")
            .with_position(Vec3::new(2.0, 1.5, 0.0)),
    )?;
    bridge.send_event(&Score::new(50, 50).with_reason("coin"))?;
    bridge.send_event(
        &Interaction::new("lever", "pull").with_position(Vec3::new(4.0, 0.0, 1.0)),
    )?;
    bridge.send_event(&Emotion::new("joy", 0.8).with_trigger("secret found"))?;
    bridge.send_event(
        &LearningProgress::new("math", "fractions", 0.75).with_correct(true),
    )?;
    bridge.send_event(&Achievement::new("first_steps").with_name("First Steps"))?;
    bridge.send_event(&LevelComplete::new("Tutorial", 45.5, 1000, true))?;
    bridge.send_event(&GamePhase::new("results").with_previous_phase("playing"))?;
    bridge.send_event(&SceneChange::new("tutorial", "main_menu"))?;
    bridge.send_custom(
        "BossDefeated",
        serde_json::json!({ "boss": "dragon", "attempts": 3 }),
    )?;
    bridge.send_event(&AppLifecycle::new(LifecyclePhase::Quit))?;

    // Let the writer flush and any collector replies arrive.
    for _ in 0..25 {
        bridge.tick();
        thread::sleep(Duration::from_millis(20));
    }

    bridge.disconnect();
    let deadline = Instant::now() + CONNECT_TIMEOUT;
    while bridge.state() != ConnState::Closed && Instant::now() < deadline {
        bridge.tick();
        thread::sleep(Duration::from_millis(20));
    }

    tracing::info!("session reported");
    Ok(())
}
