//! Simulated objects
//!
//! Every gameplay object shares one kinematic/combat base (`Entity`) and carries
//! a kind-specific payload (`Role`). Cosmetic particles live in their own
//! collection (see `particle`) and never take part in gameplay queries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::heading_vec;
use crate::tuning::{ArenaTuning, OpponentTuning, OpponentsTuning, PlayerTuning, ProjectileTuning, SmartMunitionTuning};

/// Stable identifier, unique within a match
pub type EntityId = u32;

/// Discriminant over everything the arena can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    LightOpponent,
    HeavyOpponent,
    Obstacle,
    Projectile,
    SmartMunition,
    Particle,
}

impl EntityKind {
    pub fn is_opponent(self) -> bool {
        matches!(self, EntityKind::LightOpponent | EntityKind::HeavyOpponent)
    }

    /// Self-expiring damage dealers; exempt from drag and bounds
    pub fn is_munition(self) -> bool {
        matches!(self, EntityKind::Projectile | EntityKind::SmartMunition)
    }

    /// Solid things munitions can collide with (before allegiance filtering)
    pub fn is_body(self) -> bool {
        matches!(
            self,
            EntityKind::Player | EntityKind::LightOpponent | EntityKind::HeavyOpponent | EntityKind::Obstacle
        )
    }
}

/// Opponent weight class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentClass {
    Light,
    Heavy,
}

impl OpponentClass {
    pub fn kind(self) -> EntityKind {
        match self {
            OpponentClass::Light => EntityKind::LightOpponent,
            OpponentClass::Heavy => EntityKind::HeavyOpponent,
        }
    }

    pub fn tuning(self, opponents: &OpponentsTuning) -> OpponentTuning {
        match self {
            OpponentClass::Light => opponents.light,
            OpponentClass::Heavy => opponents.heavy,
        }
    }
}

/// Which side fired a munition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allegiance {
    Player,
    Hostile,
}

impl Allegiance {
    /// Friendly fire is excluded by kind, never by proximity
    pub fn can_hit(self, target: EntityKind) -> bool {
        match self {
            Allegiance::Player => target != EntityKind::Player,
            Allegiance::Hostile => !target.is_opponent(),
        }
    }
}

/// Aimable gun with a frame-counted cooldown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    /// Bearing in radians
    pub rotation: f32,
    /// Frames until the next shot is allowed
    pub cooldown: u32,
    /// Cooldown period applied after each shot
    pub max_cooldown: u32,
}

impl Turret {
    pub fn new(max_cooldown: u32) -> Self {
        Self {
            rotation: 0.0,
            cooldown: 0,
            max_cooldown,
        }
    }

    /// Count down one frame
    pub fn cool(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    pub fn ready(&self) -> bool {
        self.cooldown == 0
    }

    pub fn reset(&mut self) {
        self.cooldown = self.max_cooldown;
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Player { turret: Turret },
    Opponent { class: OpponentClass, turret: Turret },
    Obstacle,
    Projectile {
        allegiance: Allegiance,
        damage: f32,
        ticks_alive: u32,
    },
    SmartMunition { ticks_alive: u32 },
}

/// A gameplay object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    /// Units per second
    pub vel: Vec2,
    /// Body rotation (radians)
    pub rotation: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Recent-hit tint, 0..=1, decays each frame
    pub hit_flash: f32,
    /// Half-width / half-height in world units
    pub half_extent: Vec2,
    /// Marked for purge at the end of the frame
    pub dead: bool,
    pub role: Role,
}

impl Entity {
    fn base(id: EntityId, pos: Vec2, half_extent: f32, hp: f32, role: Role) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            hp,
            max_hp: hp,
            hit_flash: 0.0,
            half_extent: Vec2::splat(half_extent),
            dead: false,
            role,
        }
    }

    pub fn player(id: EntityId, tuning: &PlayerTuning, fire_rate_level: u8, health_level: u8) -> Self {
        Self::base(
            id,
            tuning.start,
            tuning.half_extent,
            tuning.max_hp(health_level),
            Role::Player {
                turret: Turret::new(tuning.cooldown(fire_rate_level)),
            },
        )
    }

    pub fn opponent(id: EntityId, class: OpponentClass, pos: Vec2, opponents: &OpponentsTuning) -> Self {
        let t = class.tuning(opponents);
        Self::base(
            id,
            pos,
            t.half_extent,
            t.hp,
            Role::Opponent {
                class,
                turret: Turret::new(t.cooldown),
            },
        )
    }

    pub fn obstacle(id: EntityId, pos: Vec2, arena: &ArenaTuning) -> Self {
        Self::base(id, pos, arena.obstacle_half_extent, arena.obstacle_hp, Role::Obstacle)
    }

    pub fn projectile(
        id: EntityId,
        pos: Vec2,
        angle: f32,
        allegiance: Allegiance,
        damage: f32,
        tuning: &ProjectileTuning,
    ) -> Self {
        let mut e = Self::base(
            id,
            pos,
            tuning.radius,
            1.0,
            Role::Projectile {
                allegiance,
                damage,
                ticks_alive: 0,
            },
        );
        e.vel = heading_vec(angle) * tuning.speed;
        e.rotation = angle;
        e
    }

    pub fn smart_munition(id: EntityId, pos: Vec2, angle: f32, tuning: &SmartMunitionTuning) -> Self {
        let mut e = Self::base(id, pos, tuning.half_extent, 1.0, Role::SmartMunition { ticks_alive: 0 });
        e.vel = heading_vec(angle) * tuning.launch_speed;
        e.rotation = angle;
        e
    }

    pub fn kind(&self) -> EntityKind {
        match &self.role {
            Role::Player { .. } => EntityKind::Player,
            Role::Opponent { class, .. } => class.kind(),
            Role::Obstacle => EntityKind::Obstacle,
            Role::Projectile { .. } => EntityKind::Projectile,
            Role::SmartMunition { .. } => EntityKind::SmartMunition,
        }
    }

    pub fn turret(&self) -> Option<&Turret> {
        match &self.role {
            Role::Player { turret } | Role::Opponent { turret, .. } => Some(turret),
            _ => None,
        }
    }

    pub fn turret_mut(&mut self) -> Option<&mut Turret> {
        match &mut self.role {
            Role::Player { turret } | Role::Opponent { turret, .. } => Some(turret),
            _ => None,
        }
    }

    /// Collision radius used by munition hit tests
    pub fn half_width(&self) -> f32 {
        self.half_extent.x
    }

    /// Subtract hp; returns true if this hit killed the entity.
    /// hp never goes below zero and a lethal hit marks `dead` immediately.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.dead = true;
            return true;
        }
        false
    }

    pub fn flash(&mut self, intensity: f32) {
        self.hit_flash = intensity.clamp(0.0, 1.0);
    }
}
