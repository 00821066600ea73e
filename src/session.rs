//! Host-facing frame loop
//!
//! The host owns the status (menu, playing, shop, game over), writes input and
//! upgrade levels, and calls [`Session::frame`] once per displayed frame with a
//! millisecond timestamp. The session measures the elapsed time, runs either a
//! full simulation tick or a cosmetic step, and hands back the frame's events.

use serde::{Deserialize, Serialize};

use crate::advisory::{AdvisoryDesk, AdvisoryReply, Ticket, status_line};
use crate::consts::MAX_FRAME_DT;
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, TickInput, UpgradeLevels, apply_upgrades, step_cosmetics, tick};
use crate::tuning::Tuning;

/// Screen the host is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Menu,
    Playing,
    Shop,
    GameOver,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Menu => "MENU",
            GameStatus::Playing => "PLAYING",
            GameStatus::Shop => "SHOP",
            GameStatus::GameOver => "GAME_OVER",
        }
    }

    /// Statuses that need a match in the arena (the shop previews the tank)
    pub fn needs_match(&self) -> bool {
        matches!(self, GameStatus::Playing | GameStatus::Shop)
    }
}

/// Turns host timestamps into frame durations
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    /// Seconds since the previous call, clamped to `[0, MAX_FRAME_DT]`.
    /// The first call returns 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Seconds simulated
    pub dt: f32,
    pub events: Vec<GameEvent>,
    /// Advisory replies that finished since the previous frame
    pub advice: Vec<AdvisoryReply>,
}

/// One player's game: simulation state plus everything the host drives it with
pub struct Session {
    pub state: GameState,
    pub settings: Settings,
    /// Input for the next frame (the host overwrites it as devices report)
    pub input: TickInput,
    /// Upgrade levels as bought in the shop
    pub upgrades: UpgradeLevels,
    status: GameStatus,
    clock: FrameClock,
    advisory: Option<AdvisoryDesk>,
}

impl Session {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let state = GameState::new(seed, tuning, settings.max_particles());
        Self {
            state,
            settings,
            input: TickInput::default(),
            upgrades: UpgradeLevels::default(),
            status: GameStatus::Menu,
            clock: FrameClock::default(),
            advisory: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Switch screens. Entering play or the shop without a live tank starts a
    /// fresh match with the current upgrade levels.
    pub fn set_status(&mut self, status: GameStatus) {
        if status != self.status {
            log::debug!("Status {} -> {}", self.status.as_str(), status.as_str());
        }
        self.status = status;
        if status.needs_match() && !self.state.is_match_active() {
            self.state.start_match(self.upgrades.clamped());
        }
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.state.vfx.set_cap(settings.max_particles());
        self.settings = settings;
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn wave(&self) -> u32 {
        self.state.wave
    }

    /// Run one frame at host time `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        let dt = self.clock.advance(now_ms);
        self.step(dt)
    }

    /// Run one frame of `dt` seconds
    pub fn step(&mut self, dt: f32) -> FrameReport {
        apply_upgrades(&mut self.state, self.upgrades);

        if self.status == GameStatus::Playing {
            tick(&mut self.state, &self.input, dt);
        } else {
            step_cosmetics(&mut self.state, dt);
        }

        let events = self.state.drain_events();
        if events.iter().any(|e| matches!(e, GameEvent::MatchOver { .. })) {
            self.status = GameStatus::GameOver;
        }

        let advice = self
            .advisory
            .as_mut()
            .map(|desk| desk.poll())
            .unwrap_or_default();

        FrameReport { dt, events, advice }
    }

    pub fn attach_advisory(&mut self, desk: AdvisoryDesk) {
        self.advisory = Some(desk);
    }

    /// Send a question with the current status line. `None` when no advisory
    /// desk is attached.
    pub fn ask(&mut self, message: &str) -> Option<Ticket> {
        let status = status_line(self.status, self.state.wave, self.state.score);
        let desk = self.advisory.as_mut()?;
        Some(desk.request(message, &status))
    }
}
