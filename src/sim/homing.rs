//! Player-launched homing munition
//!
//! Launches slow along the turret bearing, then locks onto the nearest live
//! opponent inside the acquisition radius and turns toward it at a bounded
//! rate. Without a lock it coasts on its last velocity. Hits opponents and
//! obstacles (never the player) and is consumed by its first hit.

use glam::Vec2;

use super::combat::{apply_hit, find_target, DEATH_BURST};
use super::entity::{Entity, EntityId, EntityKind, Role};
use super::state::GameState;
use crate::{bearing, heading_vec, palette, wrap_angle};

/// Particles in the launch puff
const LAUNCH_BURST: usize = 5;

/// Turn `current` toward `desired` by at most `max_turn` radians, shortest way
pub fn steer(current: f32, desired: f32, max_turn: f32) -> f32 {
    let diff = wrap_angle(desired - current);
    wrap_angle(current + diff.clamp(-max_turn, max_turn))
}

/// Index of the nearest live opponent strictly inside `radius` of `pos`
pub fn acquire(entities: &[Entity], pos: Vec2, radius: f32) -> Option<usize> {
    entities
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.dead && e.kind().is_opponent())
        .map(|(i, e)| (i, e.pos.distance(pos)))
        .filter(|&(_, d)| d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Launch one munition from the live player along its turret bearing
pub fn launch(state: &mut GameState) -> Option<EntityId> {
    let player = state.player()?;
    let pos = player.pos;
    let angle = player.turret().map_or(player.rotation, |t| t.rotation);

    let id = state.next_entity_id();
    let tuning = state.tuning.smart_munition;
    state
        .entities
        .push(Entity::smart_munition(id, pos, angle, &tuning));
    state
        .vfx
        .explosion(&mut state.rng, pos, palette::SMART_MUNITION, LAUNCH_BURST);
    log::debug!("Smart munition {id} launched at {angle:.2} rad");
    Some(id)
}

/// Homing phase: lifetime, guidance, exhaust trail, and hit resolution
pub fn step(state: &mut GameState, dt: f32) {
    let tuning = state.tuning.smart_munition;

    for i in 0..state.entities.len() {
        let e = &mut state.entities[i];
        if e.dead {
            continue;
        }
        let Role::SmartMunition { ticks_alive } = &mut e.role else {
            continue;
        };
        *ticks_alive += 1;
        let ticks = *ticks_alive;
        if ticks > tuning.lifetime_ticks {
            e.dead = true;
            continue;
        }

        let pos = state.entities[i].pos;
        if let Some(t) = acquire(&state.entities, pos, tuning.acquisition_radius) {
            let desired = bearing(pos, state.entities[t].pos);
            let m = &mut state.entities[i];
            let heading = steer(m.rotation, desired, tuning.turn_rate * dt);
            m.rotation = heading;
            m.vel = heading_vec(heading) * tuning.cruise_speed;
        }

        if tuning.trail_interval > 0 && ticks % tuning.trail_interval == 0 {
            let vel = state.entities[i].vel;
            state.vfx.trail(pos, vel);
        }

        let Some(target) = find_target(&state.entities, i, pos, tuning.hit_radius, |k| {
            k != EntityKind::Player
        }) else {
            continue;
        };
        state.entities[i].dead = true;
        apply_hit(
            state,
            target,
            tuning.damage,
            tuning.hit_flash,
            pos,
            palette::SMART_MUNITION,
            DEATH_BURST,
        );
    }
}
