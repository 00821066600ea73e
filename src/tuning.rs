//! Data-driven game balance
//!
//! Keep this separate from presentation constants (`crate::consts`) and user
//! preferences (`crate::settings`). Every field has a default, so a tuning file
//! only needs to name what it overrides.

use std::fmt;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Failure reading a JSON config file
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Playable area and static cover
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    /// Map extent in world units
    pub width: f32,
    pub height: f32,
    /// Obstacle placement attempts per match (rejected ones are skipped, not retried)
    pub obstacle_attempts: u32,
    /// Minimum distance from the player start for an obstacle
    pub obstacle_clearance: f32,
    pub obstacle_half_extent: f32,
    pub obstacle_hp: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 30.0,
            obstacle_attempts: 15,
            obstacle_clearance: 5.0,
            obstacle_half_extent: 0.5,
            obstacle_hp: 500.0,
        }
    }
}

/// The player's tank, including how upgrade levels scale it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub start: Vec2,
    pub half_extent: f32,
    pub base_hp: f32,
    pub hp_per_level: f32,
    /// Movement speed in units per second
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Frames between shots
    pub base_cooldown: u32,
    pub cooldown_per_level: u32,
    /// Body rotation easing rate (1/s)
    pub turn_rate: f32,
    /// Velocity components below this don't turn the body
    pub dead_zone: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            start: Vec2::new(5.0, 5.0),
            half_extent: 0.4,
            base_hp: 100.0,
            hp_per_level: 50.0,
            base_speed: 5.0,
            speed_per_level: 0.5,
            base_cooldown: 15,
            cooldown_per_level: 2,
            turn_rate: 10.0,
            dead_zone: 0.1,
        }
    }
}

impl PlayerTuning {
    pub fn max_hp(&self, health_level: u8) -> f32 {
        self.base_hp + self.hp_per_level * health_level as f32
    }

    pub fn speed(&self, fire_rate_level: u8) -> f32 {
        self.base_speed + self.speed_per_level * fire_rate_level as f32
    }

    pub fn cooldown(&self, fire_rate_level: u8) -> u32 {
        self.base_cooldown
            .saturating_sub(self.cooldown_per_level * fire_rate_level as u32)
            .max(1)
    }
}

/// One opponent class
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpponentTuning {
    pub half_extent: f32,
    pub hp: f32,
    /// Frames between shots
    pub cooldown: u32,
    /// Steering acceleration toward the player (units/s²)
    pub acceleration: f32,
    /// Fires when the player is within this distance
    pub engagement_range: f32,
    /// Points awarded for a kill
    pub score: u64,
}

impl OpponentTuning {
    pub fn light() -> Self {
        Self {
            half_extent: 0.4,
            hp: 60.0,
            cooldown: 40,
            acceleration: 3.0,
            engagement_range: 8.0,
            score: 100,
        }
    }

    pub fn heavy() -> Self {
        Self {
            half_extent: 0.6,
            hp: 200.0,
            cooldown: 80,
            acceleration: 1.5,
            engagement_range: 12.0,
            score: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentsTuning {
    pub light: OpponentTuning,
    pub heavy: OpponentTuning,
    /// Opponents stop closing in once this near the player
    pub hold_distance: f32,
}

impl Default for OpponentsTuning {
    fn default() -> Self {
        Self {
            light: OpponentTuning::light(),
            heavy: OpponentTuning::heavy(),
            hold_distance: 3.0,
        }
    }
}

/// Direct-fire shells
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub speed: f32,
    /// Collision radius added to the target's half-width
    pub radius: f32,
    pub lifetime_ticks: u32,
    pub base_damage: f32,
    pub damage_per_level: f32,
    pub hit_flash: f32,
    /// Muzzle flash distance ahead of the firer
    pub muzzle_offset: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 15.0,
            radius: 0.2,
            lifetime_ticks: 100,
            base_damage: 20.0,
            damage_per_level: 5.0,
            hit_flash: 0.8,
            muzzle_offset: 0.8,
        }
    }
}

impl ProjectileTuning {
    pub fn damage(&self, fire_rate_level: u8) -> f32 {
        self.base_damage + self.damage_per_level * fire_rate_level as f32
    }
}

/// Homing special weapon
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartMunitionTuning {
    pub launch_speed: f32,
    /// Speed once guidance has a target
    pub cruise_speed: f32,
    /// Maximum turn rate (rad/s)
    pub turn_rate: f32,
    pub acquisition_radius: f32,
    pub lifetime_ticks: u32,
    /// Collision radius added to the target's half-width
    pub hit_radius: f32,
    pub damage: f32,
    pub hit_flash: f32,
    /// Emit a trail particle every N ticks
    pub trail_interval: u32,
    pub half_extent: f32,
}

impl Default for SmartMunitionTuning {
    fn default() -> Self {
        Self {
            launch_speed: 8.0,
            cruise_speed: 12.0,
            turn_rate: 5.0,
            acquisition_radius: 20.0,
            lifetime_ticks: 300,
            hit_radius: 0.5,
            damage: 300.0,
            hit_flash: 1.0,
            trail_interval: 2,
            half_extent: 0.25,
        }
    }
}

/// Spawn cadence and difficulty escalation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Seconds between spawn attempts at wave 0
    pub base_interval: f32,
    pub interval_per_wave: f32,
    pub min_interval: f32,
    /// Simultaneous opponents allowed at wave 0
    pub base_cap: u32,
    pub cap_per_wave: u32,
    /// Probability a spawn is heavy once heavies are unlocked
    pub heavy_chance: f64,
    /// Heavies appear only on waves strictly above this
    pub heavy_after_wave: u32,
    /// Wave advances once score exceeds wave × this
    pub score_per_wave: u64,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_interval: 5.0,
            interval_per_wave: 0.5,
            min_interval: 1.0,
            base_cap: 5,
            cap_per_wave: 2,
            heavy_chance: 0.2,
            heavy_after_wave: 2,
            score_per_wave: 1000,
        }
    }
}

impl WaveTuning {
    pub fn spawn_interval(&self, wave: u32) -> f32 {
        (self.base_interval - self.interval_per_wave * wave as f32).max(self.min_interval)
    }

    pub fn population_cap(&self, wave: u32) -> usize {
        (self.base_cap + self.cap_per_wave * wave) as usize
    }

    pub fn heavy_allowed(&self, wave: u32) -> bool {
        wave > self.heavy_after_wave
    }

    pub fn advance_threshold(&self, wave: u32) -> u64 {
        wave as u64 * self.score_per_wave
    }
}

/// Complete gameplay balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub opponents: OpponentsTuning,
    pub projectile: ProjectileTuning,
    pub smart_munition: SmartMunitionTuning,
    pub waves: WaveTuning,
    /// Velocity kept per reference frame for non-munition kinds
    pub drag: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena: ArenaTuning::default(),
            player: PlayerTuning::default(),
            opponents: OpponentsTuning::default(),
            projectile: ProjectileTuning::default(),
            smart_munition: SmartMunitionTuning::default(),
            waves: WaveTuning::default(),
            drag: 0.9,
        }
    }
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load tuning overrides from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&text)?;
        log::info!(
            "Loaded tuning: arena {}x{}, wave step {}",
            tuning.arena.width,
            tuning.arena.height,
            tuning.waves.score_per_wave
        );
        Ok(tuning)
    }

    /// Map rectangle upper corner
    pub fn map_size(&self) -> Vec2 {
        Vec2::new(self.arena.width, self.arena.height)
    }
}
