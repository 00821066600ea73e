//! Headless demo: plays one scripted match with an autopilot, builds the render
//! geometry every frame, renders the final frame offscreen when a GPU adapter
//! is available, and asks the commander for a debrief at the end.
//!
//! Usage: `neon-siege [tuning.json]`. `RUST_LOG=info` shows the match log;
//! `GEMINI_API_KEY` (or `API_KEY`, e.g. from `.env`) enables live advisory text.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use glam::Vec2;
use neon_siege::advisory::{AdvisoryDesk, AdvisoryProvider, DEFAULT_TIMEOUT, GeminiAdvisor};
use neon_siege::consts::REFERENCE_FPS;
use neon_siege::projection::project;
use neon_siege::renderer::{CAPTURE_FORMAT, FrameGeometry, Renderer, headless_adapter};
use neon_siege::session::{GameStatus, Session};
use neon_siege::sim::{GameEvent, GameState, TickInput};
use neon_siege::{Settings, Tuning, heading_vec};

/// Longest match the demo will play, in seconds
const MAX_MATCH_SECONDS: f64 = 90.0;
/// Autopilot opens fire inside this range
const FIRE_RANGE: f32 = 10.0;
/// Frames between special-weapon launches
const SMART_INTERVAL_FRAMES: u64 = 300;
/// Size of the end-of-match snapshot
const SNAPSHOT_SIZE: (u32, u32) = (1280, 720);

/// Strafe around the nearest opponent, keep the gun on it, and fire when close
fn autopilot(state: &GameState, frame: u64) -> TickInput {
    let Some(player) = state.player() else {
        return TickInput::default();
    };
    let smart_trigger = (frame / SMART_INTERVAL_FRAMES) as u32;

    let nearest = state
        .entities
        .iter()
        .filter(|e| !e.dead && e.kind().is_opponent())
        .min_by(|a, b| {
            a.pos
                .distance(player.pos)
                .total_cmp(&b.pos.distance(player.pos))
        });

    match nearest {
        Some(target) => {
            let to_target = target.pos - player.pos;
            let strafe = to_target.perp().normalize_or_zero();
            let keep_away = if to_target.length() < 6.0 { -to_target.normalize_or_zero() } else { Vec2::ZERO };
            TickInput {
                movement: (strafe + keep_away).clamp_length_max(1.0),
                fire: to_target.length() < FIRE_RANGE,
                // Camera tracks the player, so the projected delta approximates the pointer offset
                aim: Some(project(to_target)),
                smart_trigger,
            }
        }
        None => TickInput {
            movement: heading_vec(frame as f32 * 0.02) * 0.6,
            smart_trigger,
            ..Default::default()
        },
    }
}

fn advisory_desk(runtime: tokio::runtime::Handle) -> AdvisoryDesk {
    match GeminiAdvisor::from_env(DEFAULT_TIMEOUT) {
        Ok(advisor) => {
            let provider: Arc<dyn AdvisoryProvider> = Arc::new(advisor);
            AdvisoryDesk::new(runtime, Some(provider), DEFAULT_TIMEOUT)
        }
        Err(e) => {
            log::warn!("Advisory offline: {e}");
            AdvisoryDesk::offline(runtime)
        }
    }
}

/// Render the final frame offscreen and report how much of it was drawn
async fn snapshot(geometry: &FrameGeometry) {
    let Some(adapter) = headless_adapter().await else {
        log::info!("No GPU adapter; skipping snapshot");
        return;
    };
    let renderer = match Renderer::new(&adapter, CAPTURE_FORMAT).await {
        Ok(renderer) => renderer,
        Err(e) => {
            log::warn!("Could not create render device: {e}");
            return;
        }
    };
    let (width, height) = SNAPSHOT_SIZE;
    match renderer.capture(geometry, width, height) {
        Ok(snap) => log::info!(
            "Snapshot {}x{}: {} of {} pixels drawn",
            snap.width,
            snap.height,
            snap.lit_pixels(),
            width * height
        ),
        Err(e) => log::warn!("Snapshot failed: {e}"),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();
    log::info!("Neon Siege (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => Tuning::load(&path).unwrap_or_else(|e| {
            log::warn!("Could not load tuning from {path} ({e}); using defaults");
            Tuning::default()
        }),
        None => Tuning::default(),
    };
    let settings = Settings::load("settings.json");

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut session = Session::new(seed, tuning, settings);
    log::info!("Game initialized with seed: {}", session.state.seed);
    session.attach_advisory(advisory_desk(tokio::runtime::Handle::current()));

    session.set_status(GameStatus::Playing);
    session.ask("Tank deployed. Requesting orders.");

    let frame_ms = 1000.0 / REFERENCE_FPS as f64;
    let max_frames = (MAX_MATCH_SECONDS * REFERENCE_FPS as f64) as u64;
    let mut peak_vertices = 0;
    let mut frame = 0;
    let mut last_geometry = FrameGeometry::default();

    while frame < max_frames && session.status() == GameStatus::Playing {
        session.input = autopilot(&session.state, frame);
        let report = session.frame(frame as f64 * frame_ms);

        for event in &report.events {
            match event {
                GameEvent::WaveChanged(wave) => log::info!("Wave {wave}"),
                GameEvent::MatchOver { score, wave } => {
                    log::info!("Tank destroyed on wave {wave} with {score} points")
                }
                _ => log::debug!("{event:?}"),
            }
        }
        for reply in &report.advice {
            log::info!("Commander: {}", reply.text);
        }

        last_geometry = FrameGeometry::build(&session.state, &session.settings);
        peak_vertices = peak_vertices.max(last_geometry.vertex_count());
        frame += 1;
    }

    log::info!(
        "Match finished after {:.1} s: score {}, wave {}, peak {} vertices/frame",
        frame as f64 / REFERENCE_FPS as f64,
        session.score(),
        session.wave(),
        peak_vertices
    );

    snapshot(&last_geometry).await;

    // Debrief: keep pumping cosmetic frames until the commander answers
    session.set_status(GameStatus::GameOver);
    session.ask("Match over. Debrief?");
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT + Duration::from_secs(1);
    let mut answered = 0;
    while answered < 2 && tokio::time::Instant::now() < deadline {
        for reply in session.step(0.0).advice {
            log::info!("Commander: {}", reply.text);
            answered += 1;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
