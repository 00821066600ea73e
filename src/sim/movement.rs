//! Movement integration
//!
//! Order per entity: hit-flash decay, position += velocity × dt, drag, then
//! bounds. Munitions keep their commanded velocity and are never clamped; they
//! expire on their own.

use glam::Vec2;

use super::entity::Entity;
use super::state::GameState;
use crate::{per_frame_factor, wrap_angle};

/// Advance every live entity by `dt` seconds
pub fn integrate(state: &mut GameState, dt: f32, flash_decay: f32) {
    let drag = per_frame_factor(state.tuning.drag, dt);
    let map = state.tuning.map_size();

    for e in state.entities.iter_mut().filter(|e| !e.dead) {
        decay_flash(e, flash_decay, dt);
        e.pos += e.vel * dt;

        if !e.kind().is_munition() {
            e.vel *= drag;
            e.pos = e.pos.clamp(Vec2::ZERO, map);
        }
    }
}

pub fn decay_flash(e: &mut Entity, rate: f32, dt: f32) {
    if e.hit_flash > 0.0 {
        e.hit_flash = (e.hit_flash - rate * dt).max(0.0);
    }
}

/// Fade hit flashes without moving anything (used outside active play)
pub fn decay_flashes(entities: &mut [Entity], rate: f32, dt: f32) {
    for e in entities.iter_mut() {
        decay_flash(e, rate, dt);
    }
}

/// Turn `current` toward `target` along the shorter arc. `rate × dt` is the
/// fraction of the remaining difference covered this step (capped at all of it).
pub fn ease_rotation(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let diff = wrap_angle(target - current);
    wrap_angle(current + diff * (rate * dt).min(1.0))
}
