//! Opponent spawning and wave escalation

use glam::Vec2;
use rand::Rng;

use super::entity::{EntityId, OpponentClass};
use super::state::{GameEvent, GameState};
use crate::tuning::WaveTuning;

/// Spawn timer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spawner {
    /// Seconds since the last spawn attempt
    pub timer: f32,
}

impl Spawner {
    /// Accrue `dt`; returns true (and restarts) once `interval` is exceeded
    pub fn accrue(&mut self, dt: f32, interval: f32) -> bool {
        self.timer += dt;
        if self.timer > interval {
            self.timer = 0.0;
            true
        } else {
            false
        }
    }
}

/// Uniform point on one of the four map edges
pub fn edge_position<R: Rng>(rng: &mut R, map: Vec2) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random::<f32>() * map.x, 0.0),
        1 => Vec2::new(map.x, rng.random::<f32>() * map.y),
        2 => Vec2::new(rng.random::<f32>() * map.x, map.y),
        _ => Vec2::new(0.0, rng.random::<f32>() * map.y),
    }
}

pub fn roll_class<R: Rng>(rng: &mut R, waves: &WaveTuning, wave: u32) -> OpponentClass {
    if waves.heavy_allowed(wave) && rng.random_bool(waves.heavy_chance.clamp(0.0, 1.0)) {
        OpponentClass::Heavy
    } else {
        OpponentClass::Light
    }
}

/// Spawner phase: maybe add one opponent. A due attempt that hits the
/// population cap is skipped and the timer still restarts.
pub fn step(state: &mut GameState, dt: f32) -> Option<EntityId> {
    let waves = state.tuning.waves;
    if !state.spawner.accrue(dt, waves.spawn_interval(state.wave)) {
        return None;
    }
    if state.live_opponents() >= waves.population_cap(state.wave) {
        return None;
    }

    let map = state.tuning.map_size();
    let pos = edge_position(&mut state.rng, map);
    let class = roll_class(&mut state.rng, &waves, state.wave);
    let id = state.spawn_opponent(class, pos);
    log::debug!("Spawned {:?} opponent {} at ({:.1}, {:.1})", class, id, pos.x, pos.y);
    Some(id)
}

/// Advance the wave by one if score has passed its threshold. Re-checked every
/// frame, so a large score jump escalates one wave per frame until caught up.
pub fn advance_wave(state: &mut GameState) -> bool {
    if state.score > state.tuning.waves.advance_threshold(state.wave) {
        state.wave += 1;
        log::info!("Wave {} (score {})", state.wave, state.score);
        state.events.push(GameEvent::WaveChanged(state.wave));
        true
    } else {
        false
    }
}
