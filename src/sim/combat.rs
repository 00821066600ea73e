//! Direct-fire combat: shell spawning, hit tests, damage and scoring

use glam::Vec2;

use super::entity::{Allegiance, Entity, EntityId, EntityKind, Role};
use super::particle::DEFAULT_BURST;
use super::state::GameState;
use crate::{heading_vec, palette};

/// Particles in a death explosion
pub const DEATH_BURST: usize = 20;

/// A target destroyed during hit resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
}

/// Fire a shell from the armed entity at `index` along its turret bearing and
/// restart its cooldown. Unarmed or dead entities are ignored.
pub fn fire(state: &mut GameState, index: usize) {
    let Some(owner) = state.entities.get(index) else {
        return;
    };
    if owner.dead {
        return;
    }
    let Some(angle) = owner.turret().map(|t| t.rotation) else {
        return;
    };
    let pos = owner.pos;
    let tuning = state.tuning.projectile;
    let (allegiance, damage) = if owner.kind() == EntityKind::Player {
        (Allegiance::Player, tuning.damage(state.upgrades.fire_rate))
    } else {
        (Allegiance::Hostile, tuning.damage(0))
    };

    if let Some(turret) = state.entities[index].turret_mut() {
        turret.reset();
    }

    let id = state.next_entity_id();
    state
        .entities
        .push(Entity::projectile(id, pos, angle, allegiance, damage, &tuning));
    state
        .vfx
        .muzzle_flash(pos + heading_vec(angle) * tuning.muzzle_offset);
}

/// Apply a hit to the entity at `index`: impact burst, flash, damage, and kill
/// handling when hp reaches zero.
pub fn apply_hit(
    state: &mut GameState,
    index: usize,
    damage: f32,
    flash: f32,
    impact_pos: Vec2,
    impact_color: [f32; 4],
    impact_particles: usize,
) -> Option<Kill> {
    state
        .vfx
        .explosion(&mut state.rng, impact_pos, impact_color, impact_particles);

    let target = &mut state.entities[index];
    target.flash(flash);
    if !target.take_damage(damage) {
        return None;
    }

    let kill = Kill {
        id: target.id,
        kind: target.kind(),
        pos: target.pos,
    };
    state
        .vfx
        .explosion(&mut state.rng, kill.pos, palette::DANGER, DEATH_BURST);
    on_kill(state, kill);
    Some(kill)
}

fn on_kill(state: &mut GameState, kill: Kill) {
    log::debug!("{:?} {} destroyed", kill.kind, kill.id);
    match kill.kind {
        EntityKind::LightOpponent => state.add_score(state.tuning.opponents.light.score),
        EntityKind::HeavyOpponent => state.add_score(state.tuning.opponents.heavy.score),
        EntityKind::Player => state.signal_match_over(),
        _ => {}
    }
}

/// Index of the first live body a munition at `pos` touches, honouring
/// allegiance. Dead flags are read live, so a target killed earlier in the
/// same pass can't be hit again.
pub fn find_target(
    entities: &[Entity],
    shooter: usize,
    pos: Vec2,
    radius: f32,
    accepts: impl Fn(EntityKind) -> bool,
) -> Option<usize> {
    entities.iter().enumerate().position(|(j, t)| {
        j != shooter
            && !t.dead
            && t.kind().is_body()
            && accepts(t.kind())
            && t.pos.distance(pos) < t.half_width() + radius
    })
}

/// Combat phase: age shells, expire old ones, resolve hits
pub fn resolve_projectiles(state: &mut GameState) {
    let tuning = state.tuning.projectile;

    for i in 0..state.entities.len() {
        let e = &mut state.entities[i];
        if e.dead {
            continue;
        }
        let Role::Projectile {
            allegiance,
            damage,
            ticks_alive,
        } = &mut e.role
        else {
            continue;
        };
        *ticks_alive += 1;
        let (allegiance, damage) = (*allegiance, *damage);
        if *ticks_alive > tuning.lifetime_ticks {
            e.dead = true;
            continue;
        }
        let pos = e.pos;

        let Some(target) =
            find_target(&state.entities, i, pos, tuning.radius, |k| allegiance.can_hit(k))
        else {
            continue;
        };

        state.entities[i].dead = true;
        apply_hit(
            state,
            target,
            damage,
            tuning.hit_flash,
            pos,
            palette::DANGER,
            DEFAULT_BURST,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::OpponentClass;
    use crate::sim::state::{GameEvent, UpgradeLevels};
    use crate::tuning::Tuning;

    fn arena() -> GameState {
        let mut state = GameState::new(77, Tuning::default(), 2000);
        state.start_match(UpgradeLevels::default());
        state.entities.retain(|e| e.kind() == EntityKind::Player);
        state.drain_events();
        state
    }

    fn shell(state: &mut GameState, pos: Vec2, allegiance: Allegiance, damage: f32) -> usize {
        let id = state.next_entity_id();
        let t = state.tuning.projectile;
        state
            .entities
            .push(Entity::projectile(id, pos, 0.0, allegiance, damage, &t));
        state.entities.len() - 1
    }

    #[test]
    fn test_exact_lethal_damage() {
        let mut state = arena();
        let target = state.spawn_opponent(OpponentClass::Light, Vec2::new(15.0, 15.0));
        if let Some(e) = state.entities.last_mut() {
            e.hp = 20.0;
        }
        let damage = state.tuning.projectile.damage(0);
        shell(&mut state, Vec2::new(15.1, 15.0), Allegiance::Player, damage);

        resolve_projectiles(&mut state);

        let t = state.entity(target).expect("still in arena until purge");
        assert_eq!(t.hp, 0.0);
        assert!(t.dead);
        assert_eq!(state.score, 100);
        assert_eq!(state.drain_events(), vec![GameEvent::ScoreChanged(100)]);
    }

    #[test]
    fn test_player_shells_ignore_player() {
        let mut state = arena();
        let pos = state.player().expect("player").pos;
        shell(&mut state, pos, Allegiance::Player, 20.0);
        resolve_projectiles(&mut state);
        assert_eq!(state.player().expect("player").hp, 100.0);
        assert!(!state.entities[1].dead);
    }

    #[test]
    fn test_hostile_shells_ignore_opponents() {
        let mut state = arena();
        state.spawn_opponent(OpponentClass::Heavy, Vec2::new(20.0, 20.0));
        shell(&mut state, Vec2::new(20.0, 20.0), Allegiance::Hostile, 20.0);
        resolve_projectiles(&mut state);
        assert_eq!(state.entities[1].hp, 200.0);
    }

    #[test]
    fn test_hostile_shell_hits_player_and_flashes() {
        let mut state = arena();
        let pos = state.player().expect("player").pos;
        shell(&mut state, pos + Vec2::new(0.5, 0.0), Allegiance::Hostile, 20.0);
        resolve_projectiles(&mut state);
        let player = state.player().expect("player");
        assert_eq!(player.hp, 80.0);
        assert_eq!(player.hit_flash, 0.8);
        assert!(state.entities[1].dead);
        assert!(!state.vfx.is_empty());
    }

    #[test]
    fn test_one_kill_per_target_per_pass() {
        let mut state = arena();
        let target = state.spawn_opponent(OpponentClass::Light, Vec2::new(10.0, 20.0));
        if let Some(e) = state.entities.last_mut() {
            e.hp = 10.0;
        }
        let a = shell(&mut state, Vec2::new(10.0, 20.0), Allegiance::Player, 20.0);
        let b = shell(&mut state, Vec2::new(10.0, 20.0), Allegiance::Player, 20.0);

        resolve_projectiles(&mut state);

        assert!(state.entity(target).expect("target").dead);
        assert!(state.entities[a].dead);
        // Second shell found nothing live to hit
        assert!(!state.entities[b].dead);
        assert_eq!(state.score, 100);
    }

    #[test]
    fn test_killing_player_ends_match_once() {
        let mut state = arena();
        if let Some(p) = state.player_mut() {
            p.hp = 10.0;
        }
        let pos = state.player().expect("player").pos;
        shell(&mut state, pos, Allegiance::Hostile, 20.0);
        shell(&mut state, pos, Allegiance::Hostile, 20.0);
        resolve_projectiles(&mut state);
        let overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MatchOver { .. }))
            .count();
        assert_eq!(overs, 1);
        assert!(!state.is_match_active());
    }

    #[test]
    fn test_shell_expires() {
        let mut state = arena();
        let idx = shell(&mut state, Vec2::new(100.0, 100.0), Allegiance::Player, 20.0);
        for _ in 0..100 {
            resolve_projectiles(&mut state);
        }
        assert!(!state.entities[idx].dead);
        resolve_projectiles(&mut state);
        assert!(state.entities[idx].dead);
    }

    #[test]
    fn test_fire_uses_upgrade_damage_and_resets_cooldown() {
        let mut state = arena();
        state.upgrades.fire_rate = 2;
        let idx = state.player_index().expect("player");
        fire(&mut state, idx);
        let turret = state.entities[idx].turret().expect("armed");
        assert_eq!(turret.cooldown, turret.max_cooldown);
        match &state.entities.last().expect("shell").role {
            Role::Projectile { allegiance, damage, .. } => {
                assert_eq!(*allegiance, Allegiance::Player);
                assert_eq!(*damage, 30.0);
            }
            other => panic!("expected projectile, got {other:?}"),
        }
        assert_eq!(state.vfx.len(), 1);
    }
}
