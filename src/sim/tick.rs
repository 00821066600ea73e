//! Per-frame simulation step
//!
//! A playing frame runs its phases in a fixed order: player control, spawner,
//! movement, combat, homing, AI, particles, purge, camera, wave check. Frames
//! outside active play only advance cosmetics.

use glam::Vec2;

use super::state::{GameState, UpgradeLevels};
use super::{ai, combat, homing, movement, spawner};
use crate::consts::{HIT_FLASH_DECAY, HIT_FLASH_DECAY_IDLE, MAX_FRAME_DT};
use crate::palette;
use crate::projection::{camera_target, screen_dir_to_world};

/// Input commands for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Movement direction in world axes, magnitude ≤ 1
    pub movement: Vec2,
    /// Fire button held
    pub fire: bool,
    /// Pointer offset from the view centre in screen pixels, if a pointer is aiming
    pub aim: Option<Vec2>,
    /// Special-weapon activation counter (each change launches one munition)
    pub smart_trigger: u32,
}

/// Advance an active match by `dt` seconds. Without a live player only
/// cosmetics move.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = sanitize_dt(dt);
    if !state.is_match_active() {
        step_cosmetics(state, dt);
        return;
    }

    control_player(state, input, dt);
    spawner::step(state, dt);
    movement::integrate(state, dt, HIT_FLASH_DECAY);
    combat::resolve_projectiles(state);
    homing::step(state, dt);
    ai::step(state, dt);
    state.vfx.update(dt);
    state.purge_dead();
    follow_player(state, dt);
    spawner::advance_wave(state);
    state.time_ticks += 1;
}

/// Frame outside active play: particles age, flashes fade, camera settles
pub fn step_cosmetics(state: &mut GameState, dt: f32) {
    let dt = sanitize_dt(dt);
    state.vfx.update(dt);
    movement::decay_flashes(&mut state.entities, HIT_FLASH_DECAY_IDLE, dt);
    follow_player(state, dt);
}

fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

fn follow_player(state: &mut GameState, dt: f32) {
    if let Some(pos) = state.player().map(|p| p.pos) {
        state.camera.follow(camera_target(pos), dt);
    }
}

fn control_player(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.smart_trigger != state.last_smart_trigger {
        state.last_smart_trigger = input.smart_trigger;
        homing::launch(state);
    }

    let Some(index) = state.player_index() else {
        return;
    };
    let tuning = state.tuning.player;
    let movement = if input.movement.is_finite() {
        input.movement.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };
    let aim = input
        .aim
        .filter(|a| a.is_finite())
        .map(screen_dir_to_world)
        .filter(|d| *d != Vec2::ZERO);

    let player = &mut state.entities[index];
    player.vel = movement * tuning.speed(state.upgrades.fire_rate);
    let moving = player.vel.x.abs() > tuning.dead_zone || player.vel.y.abs() > tuning.dead_zone;
    if moving {
        let heading = player.vel.y.atan2(player.vel.x);
        player.rotation = movement::ease_rotation(player.rotation, heading, tuning.turn_rate, dt);
    }

    let body = player.rotation;
    let Some(turret) = player.turret_mut() else {
        return;
    };
    match aim {
        Some(dir) => turret.rotation = dir.y.atan2(dir.x),
        None if moving => turret.rotation = body,
        None => {}
    }
    turret.cool();
    if input.fire && turret.ready() {
        combat::fire(state, index);
    }
}

/// Bring the player in line with the host's upgrade levels. Rising levels
/// re-derive stats and celebrate; falling levels are only remembered.
pub fn apply_upgrades(state: &mut GameState, levels: UpgradeLevels) {
    let levels = levels.clamped();
    let previous = state.upgrades;
    state.upgrades = levels;
    if levels == previous {
        return;
    }

    let player_tuning = state.tuning.player;
    let Some(index) = state.player_index() else {
        return;
    };

    if levels.fire_rate > previous.fire_rate {
        let player = &mut state.entities[index];
        if let Some(turret) = player.turret_mut() {
            turret.max_cooldown = player_tuning.cooldown(levels.fire_rate);
        }
        player.flash(1.0);
        let pos = player.pos;
        state
            .vfx
            .upgrade_burst(&mut state.rng, pos, palette::UPGRADE_FIRE_RATE);
        log::info!("Fire rate upgraded to level {}", levels.fire_rate);
    }

    if levels.health > previous.health {
        let player = &mut state.entities[index];
        player.max_hp = player_tuning.max_hp(levels.health);
        player.hp = player.max_hp;
        player.flash(1.0);
        let pos = player.pos;
        state.vfx.upgrade_burst(&mut state.rng, pos, palette::SUCCESS);
        log::info!("Health upgraded to level {}", levels.health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityKind, OpponentClass};
    use crate::tuning::Tuning;
    use std::f32::consts::FRAC_PI_4;

    const DT: f32 = 1.0 / 60.0;

    fn arena() -> GameState {
        let mut state = GameState::new(21, Tuning::default(), 2000);
        state.start_match(UpgradeLevels::default());
        state.entities.retain(|e| e.kind() == EntityKind::Player);
        state.drain_events();
        state
    }

    #[test]
    fn test_movement_input_moves_player() {
        let mut state = arena();
        let input = TickInput {
            movement: Vec2::X,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        let p = state.player().expect("player");
        assert!((p.pos.x - (5.0 + 5.0 * DT)).abs() < 1e-5);
        assert!((p.vel.x - 4.5).abs() < 1e-4);
        assert!(p.rotation.abs() < 1e-6);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_body_eases_toward_heading() {
        let mut state = arena();
        let input = TickInput {
            movement: Vec2::Y,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        let rot = state.player().expect("player").rotation;
        // One step covers rate × dt of the quarter turn
        assert!((rot - std::f32::consts::FRAC_PI_2 * 10.0 * DT).abs() < 1e-5);
        let turret = state.player().and_then(|p| p.turret()).expect("turret");
        assert_eq!(turret.rotation, rot);
    }

    #[test]
    fn test_pointer_aim_sets_turret() {
        let mut state = arena();
        let input = TickInput {
            aim: Some(Vec2::new(0.0, 50.0)),
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        let turret = state.player().and_then(|p| p.turret()).expect("turret");
        assert!((turret.rotation - FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_held_fire_respects_cooldown() {
        let mut state = arena();
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.count_kind(EntityKind::Projectile), 1);
        for _ in 0..14 {
            tick(&mut state, &input, DT);
        }
        assert_eq!(state.count_kind(EntityKind::Projectile), 1);
        tick(&mut state, &input, DT);
        assert_eq!(state.count_kind(EntityKind::Projectile), 2);
    }

    #[test]
    fn test_smart_trigger_is_edge_detected() {
        let mut state = arena();
        let mut input = TickInput {
            smart_trigger: 1,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        tick(&mut state, &input, DT);
        assert_eq!(state.count_kind(EntityKind::SmartMunition), 1);
        input.smart_trigger = 2;
        tick(&mut state, &input, DT);
        assert_eq!(state.count_kind(EntityKind::SmartMunition), 2);
    }

    #[test]
    fn test_dead_player_freezes_gameplay() {
        let mut state = arena();
        state.spawn_opponent(OpponentClass::Light, Vec2::new(20.0, 20.0));
        state.entities[1].vel = Vec2::new(1.0, 0.0);
        if let Some(p) = state.player_mut() {
            p.dead = true;
        }
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.entities[1].pos, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_cosmetics_only_fade() {
        let mut state = arena();
        if let Some(p) = state.player_mut() {
            p.hit_flash = 1.0;
        }
        state.vfx.muzzle_flash(Vec2::ZERO);
        step_cosmetics(&mut state, 0.2);
        let p = state.player().expect("player");
        assert_eq!(p.pos, Vec2::new(5.0, 5.0));
        // dt is capped at 0.1
        assert!((p.hit_flash - 0.75).abs() < 1e-5);
        assert_eq!(state.vfx.len(), 1);
    }

    #[test]
    fn test_health_upgrade_heals_and_bursts() {
        let mut state = arena();
        if let Some(p) = state.player_mut() {
            p.hp = 30.0;
        }
        apply_upgrades(&mut state, UpgradeLevels { fire_rate: 0, health: 2 });
        let p = state.player().expect("player");
        assert_eq!(p.max_hp, 200.0);
        assert_eq!(p.hp, 200.0);
        assert_eq!(p.hit_flash, 1.0);
        assert_eq!(state.vfx.len(), 66);
    }

    #[test]
    fn test_fire_rate_upgrade_shortens_cooldown() {
        let mut state = arena();
        apply_upgrades(&mut state, UpgradeLevels { fire_rate: 9, health: 0 });
        assert_eq!(state.upgrades.fire_rate, 3);
        let turret = state.player().and_then(|p| p.turret()).expect("turret");
        assert_eq!(turret.max_cooldown, 9);
    }

    #[test]
    fn test_downgrade_only_remembers() {
        let mut state = arena();
        apply_upgrades(&mut state, UpgradeLevels { fire_rate: 0, health: 2 });
        state.vfx.clear();
        apply_upgrades(&mut state, UpgradeLevels { fire_rate: 0, health: 1 });
        assert_eq!(state.upgrades.health, 1);
        assert_eq!(state.player().expect("player").max_hp, 200.0);
        assert!(state.vfx.is_empty());
    }
}
