//! Game state and the entity arena
//!
//! Entities live in one `Vec` addressed by index during a frame. Phases never
//! remove entries mid-frame: they set `dead`, and `purge_dead` compacts once all
//! phases have run.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::entity::{Entity, EntityId, EntityKind, OpponentClass};
use super::particle::Vfx;
use super::spawner::Spawner;
use crate::projection::camera_target;
use crate::tuning::Tuning;

/// Notifications for the host UI, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    MatchStarted,
    ScoreChanged(u64),
    WaveChanged(u32),
    /// Fired exactly once per match
    MatchOver { score: u64, wave: u32 },
}

/// Upgrade levels as last applied to the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub fire_rate: u8,
    pub health: u8,
}

/// Highest purchasable level for either upgrade
pub const MAX_UPGRADE_LEVEL: u8 = 3;

impl UpgradeLevels {
    pub fn clamped(self) -> Self {
        Self {
            fire_rate: self.fire_rate.min(MAX_UPGRADE_LEVEL),
            health: self.health.min(MAX_UPGRADE_LEVEL),
        }
    }
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub tuning: Tuning,
    /// Gameplay entities (insertion order doubles as draw tie-break order)
    pub entities: Vec<Entity>,
    /// Cosmetic particles
    pub vfx: Vfx,
    pub score: u64,
    /// Current wave (1-based, never decreases within a match)
    pub wave: u32,
    pub spawner: Spawner,
    pub camera: Camera,
    /// Frames simulated in the current match
    pub time_ticks: u64,
    pub upgrades: UpgradeLevels,
    /// Last observed special-weapon trigger counter
    pub last_smart_trigger: u32,
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    player_id: Option<EntityId>,
    match_over_sent: bool,
    next_id: EntityId,
}

impl GameState {
    /// Create an empty state (no match running yet)
    pub fn new(seed: u64, tuning: Tuning, particle_cap: usize) -> Self {
        Self {
            seed,
            tuning,
            entities: Vec::new(),
            vfx: Vfx::new(particle_cap),
            score: 0,
            wave: 1,
            spawner: Spawner::default(),
            camera: Camera::default(),
            time_ticks: 0,
            upgrades: UpgradeLevels::default(),
            last_smart_trigger: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            player_id: None,
            match_over_sent: false,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset the arena and start a fresh match with the given upgrade levels
    pub fn start_match(&mut self, upgrades: UpgradeLevels) {
        self.entities.clear();
        self.vfx.clear();
        self.score = 0;
        self.wave = 1;
        self.time_ticks = 0;
        self.spawner = Spawner::default();
        self.match_over_sent = false;
        self.upgrades = upgrades;

        let id = self.next_entity_id();
        let player = Entity::player(id, &self.tuning.player, upgrades.fire_rate, upgrades.health);
        let start = player.pos;
        self.entities.push(player);
        self.player_id = Some(id);

        // No easing on (re)start
        self.camera.snap(camera_target(start));

        self.place_obstacles(start);

        log::info!(
            "Match started (fire rate {}, health {}, {} obstacles)",
            upgrades.fire_rate,
            upgrades.health,
            self.count_kind(EntityKind::Obstacle)
        );
        self.events.push(GameEvent::MatchStarted);
        self.events.push(GameEvent::ScoreChanged(0));
        self.events.push(GameEvent::WaveChanged(1));
    }

    /// Scatter obstacles on grid cells, skipping any too close to the player start
    fn place_obstacles(&mut self, start: Vec2) {
        let arena = self.tuning.arena;
        for _ in 0..arena.obstacle_attempts {
            let cell = Vec2::new(
                (self.rng.random::<f32>() * arena.width).floor(),
                (self.rng.random::<f32>() * arena.height).floor(),
            );
            if cell.distance(start) > arena.obstacle_clearance {
                let id = self.next_entity_id();
                self.entities
                    .push(Entity::obstacle(id, cell + Vec2::splat(0.5), &arena));
            }
        }
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    /// Index of the live player, if any
    pub fn player_index(&self) -> Option<usize> {
        let id = self.player_id?;
        self.entities.iter().position(|e| e.id == id && !e.dead)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_index().map(|i| &self.entities[i])
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let i = self.player_index()?;
        Some(&mut self.entities[i])
    }

    /// A match is active while its player is alive
    pub fn is_match_active(&self) -> bool {
        self.player_index().is_some()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities
            .iter()
            .filter(|e| !e.dead && e.kind() == kind)
            .count()
    }

    pub fn live_opponents(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| !e.dead && e.kind().is_opponent())
            .count()
    }

    pub fn spawn_opponent(&mut self, class: OpponentClass, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.entities
            .push(Entity::opponent(id, class, pos, &self.tuning.opponents));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score += points;
        self.events.push(GameEvent::ScoreChanged(self.score));
    }

    /// Raise the terminal signal for this match (latched)
    pub fn signal_match_over(&mut self) {
        if self.match_over_sent {
            return;
        }
        self.match_over_sent = true;
        log::info!("Match over: score {}, wave {}", self.score, self.wave);
        self.events.push(GameEvent::MatchOver {
            score: self.score,
            wave: self.wave,
        });
    }

    /// Drop every entity marked dead. Runs once, after all resolution phases.
    pub fn purge_dead(&mut self) {
        self.entities.retain(|e| !e.dead);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        GameState::new(42, Tuning::default(), 1000)
    }

    #[test]
    fn test_start_match_layout() {
        let mut state = new_state();
        state.start_match(UpgradeLevels { fire_rate: 1, health: 2 });

        assert_eq!(state.count_kind(EntityKind::Player), 1);
        let player = state.player().expect("player");
        assert_eq!(player.max_hp, 200.0);
        assert_eq!(player.turret().map(|t| t.max_cooldown), Some(13));

        let start = state.tuning.player.start;
        for e in state.entities.iter().filter(|e| e.kind() == EntityKind::Obstacle) {
            // Clearance is measured from the grid cell, not the centred position
            let cell = e.pos - Vec2::splat(0.5);
            assert!(cell.distance(start) > 5.0);
            assert_eq!(e.pos.x.fract(), 0.5);
            assert_eq!(e.pos.y.fract(), 0.5);
        }
        assert!(state.count_kind(EntityKind::Obstacle) <= 15);
        assert_eq!(state.camera.offset, camera_target(start));
    }

    #[test]
    fn test_seed_reproduces_layout() {
        let mut a = GameState::new(42, Tuning::default(), 10);
        let mut b = GameState::new(a.seed, Tuning::default(), 10);
        a.start_match(UpgradeLevels::default());
        b.start_match(UpgradeLevels::default());
        assert_eq!(b.seed, 42);
        let layout = |s: &GameState| s.entities.iter().map(|e| e.pos).collect::<Vec<_>>();
        assert_eq!(layout(&a), layout(&b));
    }

    #[test]
    fn test_restart_resets_score_and_wave() {
        let mut state = new_state();
        state.start_match(UpgradeLevels::default());
        state.add_score(2500);
        state.wave = 3;
        state.signal_match_over();
        state.start_match(UpgradeLevels::default());
        assert_eq!(state.score, 0);
        assert_eq!(state.wave, 1);
        assert_eq!(state.count_kind(EntityKind::Player), 1);
        state.drain_events();
        // Latch re-armed for the new match
        state.signal_match_over();
        assert_eq!(state.drain_events().len(), 1);
    }

    #[test]
    fn test_match_over_latched() {
        let mut state = new_state();
        state.start_match(UpgradeLevels::default());
        state.drain_events();
        state.signal_match_over();
        state.signal_match_over();
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::MatchOver { .. }));
    }

    #[test]
    fn test_purge_keeps_order() {
        let mut state = new_state();
        let a = state.spawn_opponent(OpponentClass::Light, Vec2::ZERO);
        let b = state.spawn_opponent(OpponentClass::Heavy, Vec2::ONE);
        let c = state.spawn_opponent(OpponentClass::Light, Vec2::ONE * 2.0);
        state.entities[1].dead = true;
        state.purge_dead();
        let ids: Vec<_> = state.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(state.entity(b).is_none());
    }

    #[test]
    fn test_dead_player_is_not_found() {
        let mut state = new_state();
        state.start_match(UpgradeLevels::default());
        if let Some(p) = state.player_mut() {
            p.dead = true;
        }
        assert!(state.player().is_none());
        assert!(!state.is_match_active());
    }
}
