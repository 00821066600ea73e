//! Opponent behaviour
//!
//! Each live opponent steers toward the player until it is within the hold
//! distance, keeps its turret on the player, and fires whenever the player is
//! inside its engagement range and the gun has cooled.

use super::combat::fire;
use super::entity::Role;
use super::state::GameState;
use crate::bearing;

/// What an opponent is doing relative to the player this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    /// Out of range: drive in, hold fire
    Approach,
    /// In range: fire, and keep closing while farther than the hold distance
    Engage { closing: bool },
}

impl Stance {
    pub fn moves(self) -> bool {
        matches!(self, Stance::Approach | Stance::Engage { closing: true })
    }

    pub fn fires(self) -> bool {
        matches!(self, Stance::Engage { .. })
    }
}

pub fn assess(distance: f32, engagement_range: f32, hold_distance: f32) -> Stance {
    if distance > engagement_range {
        Stance::Approach
    } else {
        Stance::Engage {
            closing: distance > hold_distance,
        }
    }
}

/// AI phase. Does nothing once the player is gone.
pub fn step(state: &mut GameState, dt: f32) {
    let Some(target) = state.player().map(|p| p.pos) else {
        return;
    };
    let opponents = state.tuning.opponents;

    for i in 0..state.entities.len() {
        let e = &mut state.entities[i];
        if e.dead {
            continue;
        }
        let Role::Opponent { class, .. } = e.role else {
            continue;
        };
        let class_tuning = class.tuning(&opponents);

        let to_player = target - e.pos;
        let aim = bearing(e.pos, target);
        let stance = assess(
            to_player.length(),
            class_tuning.engagement_range,
            opponents.hold_distance,
        );

        if stance.moves() {
            e.vel += to_player.normalize_or_zero() * class_tuning.acceleration * dt;
            e.rotation = aim;
        }

        let Some(turret) = e.turret_mut() else {
            continue;
        };
        turret.rotation = aim;
        turret.cool();
        if stance.fires() && turret.ready() {
            fire(state, i);
        }
    }
}
