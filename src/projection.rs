//! Isometric projection
//!
//! World space is a flat grid measured in tile units (x right-down, y left-down
//! on screen). Screen space is pixels. The transform is a 45° rotation followed by
//! a 2:1 squash, so a unit world square becomes a `TILE_WIDTH` × `TILE_HEIGHT`
//! diamond.

use glam::Vec2;

use crate::consts::{TILE_HEIGHT, TILE_WIDTH};

/// Project a world position to screen pixels, then translate by `offset`
#[inline]
pub fn world_to_iso(pos: Vec2, offset: Vec2) -> Vec2 {
    Vec2::new(
        (pos.x - pos.y) * (TILE_WIDTH / 2.0),
        (pos.x + pos.y) * (TILE_HEIGHT / 2.0),
    ) + offset
}

/// Inverse of [`world_to_iso`] (used for pointer picking)
#[inline]
pub fn iso_to_world(screen: Vec2, offset: Vec2) -> Vec2 {
    let adj = screen - offset;
    let u = adj.x / (TILE_WIDTH / 2.0);
    let v = adj.y / (TILE_HEIGHT / 2.0);
    Vec2::new((v + u) / 2.0, (v - u) / 2.0)
}

/// Projected position with no camera offset
#[inline]
pub fn project(pos: Vec2) -> Vec2 {
    world_to_iso(pos, Vec2::ZERO)
}

/// Camera offset that puts `focus` at the view centre
#[inline]
pub fn camera_target(focus: Vec2) -> Vec2 {
    -project(focus)
}

/// Convert a screen-space direction (e.g. pointer offset from view centre) into
/// a normalized world-space direction. Zero in, zero out.
pub fn screen_dir_to_world(dir: Vec2) -> Vec2 {
    iso_to_world(dir, Vec2::ZERO).normalize_or_zero()
}
