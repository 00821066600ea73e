//! Arena simulation
//!
//! All gameplay lives here, with no rendering or platform dependencies:
//! - Variable time step, capped by the caller
//! - Seeded RNG owned by the state
//! - Entities addressed by index within a frame, purged once at the end

pub mod ai;
pub mod camera;
pub mod combat;
pub mod entity;
pub mod homing;
pub mod movement;
pub mod particle;
pub mod spawner;
pub mod state;
pub mod tick;

pub use ai::{Stance, assess};
pub use camera::Camera;
pub use entity::{Allegiance, Entity, EntityId, EntityKind, OpponentClass, Role, Turret};
pub use particle::{Particle, Vfx};
pub use state::{GameEvent, GameState, MAX_UPGRADE_LEVEL, UpgradeLevels};
pub use tick::{TickInput, apply_upgrades, step_cosmetics, tick};
