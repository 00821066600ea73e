//! Radar minimap
//!
//! Top-down (unprojected) view centred on the player. Coordinates are pixels
//! relative to the radar centre; the pipeline maps them into the radar viewport.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, with_alpha};
use crate::consts::RADAR_RANGE;
use crate::palette;
use crate::sim::{EntityKind, GameState};

/// A contact on the scope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blip {
    /// Pixels from the radar centre
    pub offset: Vec2,
    pub color: [f32; 4],
    pub radius: f32,
}

/// Colour and pixel radius per kind; `None` for kinds the radar ignores
pub fn blip_style(kind: EntityKind) -> Option<([f32; 4], f32)> {
    match kind {
        EntityKind::LightOpponent => Some((palette::DANGER, 3.0)),
        EntityKind::HeavyOpponent => Some((palette::RADAR_HEAVY, 5.0)),
        EntityKind::Obstacle => Some((palette::RADAR_OBSTACLE, 2.0)),
        _ => None,
    }
}

/// Contacts for a scope of `radius` pixels. Entities outside the world-space
/// range box are culled before scaling; what lands outside the circle is
/// clipped away.
pub fn blips(state: &GameState, radius: f32) -> Vec<Blip> {
    let Some(player) = state.player() else {
        return Vec::new();
    };
    let origin = player.pos;

    state
        .entities
        .iter()
        .filter(|e| !e.dead && e.id != player.id)
        .filter_map(|e| {
            let (color, size) = blip_style(e.kind())?;
            let d = e.pos - origin;
            if d.x.abs() > RADAR_RANGE || d.y.abs() > RADAR_RANGE {
                return None;
            }
            let offset = d / RADAR_RANGE * radius;
            (offset.length() <= radius).then_some(Blip {
                offset,
                color,
                radius: size,
            })
        })
        .collect()
}

/// Build the radar for a `size` × `size` pixel viewport
pub fn build(state: &GameState, size: f32) -> Vec<Vertex> {
    let radius = size / 2.0;
    let line_color = with_alpha(palette::PRIMARY, 0.2);
    let mut out = Vec::new();

    out.extend(shapes::circle(
        Vec2::ZERO,
        radius,
        with_alpha(palette::BACKGROUND, 0.85),
        32,
    ));
    out.extend(shapes::line(Vec2::new(-radius, 0.0), Vec2::new(radius, 0.0), 1.0, line_color));
    out.extend(shapes::line(Vec2::new(0.0, -radius), Vec2::new(0.0, radius), 1.0, line_color));
    out.extend(shapes::ring(Vec2::ZERO, radius * 0.5 - 0.5, radius * 0.5 + 0.5, line_color, 32));

    let Some(player) = state.player() else {
        return out;
    };

    let rot = Vec2::from_angle(player.rotation);
    out.extend(shapes::triangle(
        rot.rotate(Vec2::new(6.0, 0.0)),
        rot.rotate(Vec2::new(-4.0, 4.0)),
        rot.rotate(Vec2::new(-4.0, -4.0)),
        palette::PRIMARY,
    ));

    for blip in blips(state, radius) {
        out.extend(shapes::circle(blip.offset, blip.radius, blip.color, 8));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{OpponentClass, UpgradeLevels};
    use crate::tuning::Tuning;

    fn arena() -> GameState {
        let mut state = GameState::new(4, Tuning::default(), 100);
        state.start_match(UpgradeLevels::default());
        state.entities.retain(|e| e.kind() == EntityKind::Player);
        state
    }

    #[test]
    fn test_blip_scaling_and_style() {
        let mut state = arena();
        state.spawn_opponent(OpponentClass::Heavy, Vec2::new(17.5, 5.0));
        let b = blips(&state, 80.0);
        assert_eq!(b.len(), 1);
        assert!((b[0].offset - Vec2::new(40.0, 0.0)).length() < 1e-4);
        assert_eq!(b[0].color, palette::RADAR_HEAVY);
        assert_eq!(b[0].radius, 5.0);
    }

    #[test]
    fn test_out_of_range_culled() {
        let mut state = arena();
        // Inside the square range on both axes but beyond the circle
        state.spawn_opponent(OpponentClass::Light, Vec2::new(28.0, 28.0));
        // Outside the range box on one axis
        state.spawn_opponent(OpponentClass::Heavy, Vec2::new(5.0, 31.0));
        assert!(blips(&state, 80.0).is_empty());
    }

    #[test]
    fn test_munitions_not_shown() {
        let mut state = arena();
        let id = state.next_entity_id();
        let t = state.tuning.projectile;
        state.entities.push(crate::sim::Entity::projectile(
            id,
            Vec2::new(6.0, 6.0),
            0.0,
            crate::sim::Allegiance::Hostile,
            20.0,
            &t,
        ));
        assert!(blips(&state, 80.0).is_empty());
    }

    #[test]
    fn test_no_player_draws_only_frame() {
        let mut state = arena();
        state.spawn_opponent(OpponentClass::Light, Vec2::new(6.0, 6.0));
        let with_player = build(&state, 160.0).len();
        if let Some(p) = state.player_mut() {
            p.dead = true;
        }
        let without = build(&state, 160.0).len();
        // Player glyph (3) and one blip (24) gone
        assert_eq!(with_player - without, 27);
    }
}
