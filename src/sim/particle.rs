//! Cosmetic particles
//!
//! Particles are fire-and-forget: emitters append them, `Vfx::update` ages and
//! moves them, and nothing in gameplay reads them back.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::palette;
use crate::sim::entity::EntityKind;
use crate::{heading_vec, lerp_color};

/// A short-lived visual-only entity. Lifetime is counted in frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub scale: f32,
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
}

impl Particle {
    pub fn kind(&self) -> EntityKind {
        EntityKind::Particle
    }

    /// Remaining life in 0..=1
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    /// Current colour, moving from start toward end as life runs out
    pub fn color(&self) -> [f32; 4] {
        lerp_color(self.start_color, self.end_color, 1.0 - self.life_fraction())
    }
}

/// Explosion particles per burst when a caller doesn't ask for more
pub const DEFAULT_BURST: usize = 8;

/// Particle store plus the emitters that feed it
#[derive(Debug, Clone)]
pub struct Vfx {
    pub particles: Vec<Particle>,
    cap: usize,
}

impl Vfx {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: Vec::new(),
            cap,
        }
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        self.particles.truncate(cap);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn push(&mut self, particle: Particle) {
        if self.particles.len() < self.cap {
            self.particles.push(particle);
        }
    }

    /// Radial burst in random directions (impacts, deaths, launches)
    pub fn explosion<R: Rng>(&mut self, rng: &mut R, pos: Vec2, color: [f32; 4], count: usize) {
        for _ in 0..count {
            let angle = rng.random::<f32>() * TAU;
            let speed = rng.random::<f32>() * 5.0;
            self.push(Particle {
                pos,
                vel: heading_vec(angle) * speed,
                life: 30.0 + rng.random::<f32>() * 20.0,
                max_life: 50.0,
                scale: rng.random::<f32>() * 0.5 + 0.5,
                start_color: color,
                end_color: palette::WHITE,
            });
        }
    }

    /// Evenly spaced expanding ring
    pub fn ring(&mut self, pos: Vec2, color: [f32; 4], count: usize, speed: f32) {
        for i in 0..count {
            let angle = (i as f32 / count as f32) * TAU;
            self.push(Particle {
                pos,
                vel: heading_vec(angle) * speed,
                life: 40.0,
                max_life: 40.0,
                scale: 0.8,
                start_color: color,
                end_color: palette::WHITE,
            });
        }
    }

    /// Jittered sparks drifting "up" the screen (−y)
    pub fn sparks<R: Rng>(&mut self, rng: &mut R, pos: Vec2, color: [f32; 4], count: usize) {
        for _ in 0..count {
            let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5);
            let vel = Vec2::new(
                (rng.random::<f32>() - 0.5) * 2.0,
                (rng.random::<f32>() - 0.5) * 2.0 - 2.0,
            );
            self.push(Particle {
                pos: pos + jitter,
                vel,
                life: 60.0,
                max_life: 60.0,
                scale: rng.random::<f32>() * 0.5 + 0.5,
                start_color: palette::WHITE,
                end_color: color,
            });
        }
    }

    /// Shockwave ring plus rising sparks
    pub fn upgrade_burst<R: Rng>(&mut self, rng: &mut R, pos: Vec2, color: [f32; 4]) {
        self.ring(pos, color, 36, 4.0);
        self.sparks(rng, pos, color, 30);
    }

    pub fn muzzle_flash(&mut self, pos: Vec2) {
        self.push(Particle {
            pos,
            vel: Vec2::ZERO,
            life: 5.0,
            max_life: 5.0,
            scale: 1.0,
            start_color: palette::WHITE,
            end_color: palette::WHITE,
        });
    }

    /// Exhaust puff behind a moving munition
    pub fn trail(&mut self, pos: Vec2, vel: Vec2) {
        self.push(Particle {
            pos,
            vel: -vel * 0.1,
            life: 15.0,
            max_life: 15.0,
            scale: 0.5,
            start_color: palette::SMART_MUNITION,
            end_color: palette::BLACK,
        });
    }

    /// Age every particle by one frame, move it, and drop the expired ones
    pub fn update(&mut self, dt: f32) {
        for p in self.particles.iter_mut() {
            p.life -= 1.0;
            p.pos += p.vel * dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}
