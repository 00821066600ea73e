//! Neon Siege - an isometric hover-tank arena
//!
//! Core modules:
//! - `sim`: Simulation (entities, physics, combat, AI, waves, particles, camera)
//! - `renderer`: Depth-sorted isometric view, radar, WebGPU pipeline
//! - `projection`: World <-> isometric screen transforms
//! - `session`: Host-facing frame loop (time step, status gating, events)
//! - `advisory`: Decorative tactical advice over an async side channel
//! - `tuning`: Data-driven game balance
//! - `settings`: Presentation preferences

pub mod advisory;
pub mod projection;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Presentation and frame-loop constants
pub mod consts {
    /// Screen pixels per world unit along a tile edge
    pub const TILE_SIZE: f32 = 40.0;
    /// Isometric tile footprint (2:1 diamond)
    pub const TILE_WIDTH: f32 = TILE_SIZE * 2.0;
    pub const TILE_HEIGHT: f32 = TILE_SIZE;

    /// Frame rate the per-frame factors (drag, camera smoothing) are expressed at
    pub const REFERENCE_FPS: f32 = 60.0;
    pub const REFERENCE_DT: f32 = 1.0 / REFERENCE_FPS;
    /// Largest time step a single frame may advance (stall protection)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Camera closes this fraction of the remaining distance per reference frame
    pub const CAMERA_SMOOTHING: f32 = 0.1;

    /// Hit-flash fade speed (intensity per second) during play
    pub const HIT_FLASH_DECAY: f32 = 2.0;
    /// Hit-flash fade speed outside play (shop preview)
    pub const HIT_FLASH_DECAY_IDLE: f32 = 2.5;

    /// Radar world-space range (units from the player, per axis)
    pub const RADAR_RANGE: f32 = 25.0;
}

/// Named colours (linear RGBA) shared by the simulation's effects and the renderer
pub mod palette {
    pub const fn hex(rgb: u32) -> [f32; 4] {
        [
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
            1.0,
        ]
    }

    pub const BACKGROUND: [f32; 4] = hex(0x0f0518);
    pub const GRID: [f32; 4] = hex(0x2e1065);
    /// Player and player shells
    pub const PRIMARY: [f32; 4] = hex(0x06b6d4);
    /// Light opponents
    pub const ACCENT: [f32; 4] = hex(0xd946ef);
    /// Heavy opponents, hostile shells, explosions
    pub const DANGER: [f32; 4] = hex(0xf97316);
    pub const SUCCESS: [f32; 4] = hex(0x10b981);
    pub const UPGRADE_FIRE_RATE: [f32; 4] = hex(0x22d3ee);
    pub const OBSTACLE: [f32; 4] = hex(0x475569);
    pub const SMART_MUNITION: [f32; 4] = hex(0xfbbf24);
    pub const RADAR_HEAVY: [f32; 4] = hex(0xef4444);
    pub const RADAR_OBSTACLE: [f32; 4] = hex(0x64748b);
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}

/// Wrap an angle into (-π, π]
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Bearing (radians) from one point to another
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Unit vector for a bearing
#[inline]
pub fn heading_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}

/// Linear RGBA interpolation
#[inline]
pub fn lerp_color(start: [f32; 4], end: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp(start[0], end[0], t),
        lerp(start[1], end[1], t),
        lerp(start[2], end[2], t),
        lerp(start[3], end[3], t),
    ]
}

/// Convert a per-reference-frame factor into the factor for a step of `dt` seconds
#[inline]
pub fn per_frame_factor(factor: f32, dt: f32) -> f32 {
    factor.powf(dt / consts::REFERENCE_DT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[test]
    fn test_wrap_angle_boundaries() {
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert!((wrap_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(wrap_angle(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_wrap_angle_in_range_is_exact() {
        for a in [0.7, 3.0, -3.1, 1e-7, PI] {
            assert_eq!(wrap_angle(a), a);
        }
    }

    #[test]
    fn test_per_frame_factor_at_reference_rate() {
        let f = per_frame_factor(0.9, consts::REFERENCE_DT);
        assert!((f - 0.9).abs() < 1e-5);
        // Two half-steps compose to one reference step
        let half = per_frame_factor(0.9, consts::REFERENCE_DT * 0.5);
        assert!((half * half - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_bearing() {
        let b = bearing(Vec2::ZERO, Vec2::new(0.0, 2.0));
        assert!((b - PI / 2.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_wrap_angle_in_range(a in -1000.0f32..1000.0) {
            let w = wrap_angle(a);
            prop_assert!(w > -PI - 1e-4 && w <= PI + 1e-4);
            // Same direction as the input
            prop_assert!((w.cos() - a.cos()).abs() < 1e-2);
            prop_assert!((w.sin() - a.sin()).abs() < 1e-2);
        }
    }
}
