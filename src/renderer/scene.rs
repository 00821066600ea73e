//! Main isometric view
//!
//! Produces one triangle list in screen pixels relative to the view centre
//! (y down). Everything is painted back to front by `pos.x + pos.y`, so no
//! depth buffer is needed.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, shade, with_alpha};
use crate::projection::{project, world_to_iso};
use crate::settings::Settings;
use crate::sim::{Allegiance, Entity, EntityKind, GameState, Particle, Role};
use crate::{heading_vec, lerp_color, palette};

/// Screen pixels per world unit of half-extent on a body's top face
const BODY_SCALE: f32 = 40.0;
/// Half-height of a body's top-face diamond
const FACE_HALF_HEIGHT: f32 = 10.0;
const OBSTACLE_HEIGHT: f32 = 30.0;
const VEHICLE_HEIGHT: f32 = 10.0;
/// Height munitions fly at
const MUNITION_HEIGHT: f32 = 20.0;
const PARTICLE_HEIGHT: f32 = 10.0;
const HEALTH_BAR_WIDTH: f32 = 40.0;
const HEALTH_BAR_RED: [f32; 4] = palette::hex(0xff0000);
const HEALTH_BAR_GREEN: [f32; 4] = palette::hex(0x00ff00);

/// Painter's-algorithm depth key
#[inline]
pub fn depth(pos: Vec2) -> f32 {
    pos.x + pos.y
}

/// Something the scene draws
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    Entity(&'a Entity),
    Particle(&'a Particle),
}

impl Drawable<'_> {
    pub fn pos(&self) -> Vec2 {
        match self {
            Drawable::Entity(e) => e.pos,
            Drawable::Particle(p) => p.pos,
        }
    }
}

/// Live entities then particles, stably sorted back to front
pub fn draw_order(state: &GameState) -> Vec<Drawable<'_>> {
    let mut items: Vec<Drawable> = state
        .entities
        .iter()
        .filter(|e| !e.dead)
        .map(Drawable::Entity)
        .chain(state.vfx.particles.iter().map(Drawable::Particle))
        .collect();
    items.sort_by(|a, b| depth(a.pos()).total_cmp(&depth(b.pos())));
    items
}

/// Angle on screen of a world-space bearing
pub fn screen_angle(world_angle: f32) -> f32 {
    let d = project(heading_vec(world_angle));
    d.y.atan2(d.x)
}

/// Mix toward white by the hit-flash intensity unless flashes are disabled
pub fn flash_color(base: [f32; 4], hit_flash: f32, settings: &Settings) -> [f32; 4] {
    if settings.effective_hit_flash() && hit_flash > 0.0 {
        lerp_color(base, palette::WHITE, hit_flash)
    } else {
        base
    }
}

pub fn body_color(kind: EntityKind) -> [f32; 4] {
    match kind {
        EntityKind::Player => palette::PRIMARY,
        EntityKind::LightOpponent => palette::ACCENT,
        EntityKind::HeavyOpponent => palette::DANGER,
        EntityKind::Obstacle => palette::OBSTACLE,
        EntityKind::SmartMunition => palette::SMART_MUNITION,
        EntityKind::Projectile | EntityKind::Particle => palette::WHITE,
    }
}

/// Build the whole main view
pub fn build(state: &GameState, settings: &Settings) -> Vec<Vertex> {
    let offset = state.camera.offset;
    let mut out = Vec::new();

    floor_grid(&mut out, state.tuning.map_size(), offset);

    for item in draw_order(state) {
        match item {
            Drawable::Entity(e) => match &e.role {
                Role::Projectile { allegiance, .. } => projectile(&mut out, e, *allegiance, offset),
                Role::SmartMunition { .. } => smart_munition(&mut out, e, offset),
                _ => body(&mut out, e, offset, settings),
            },
            Drawable::Particle(p) => particle(&mut out, p, offset),
        }
    }
    out
}

fn floor_grid(out: &mut Vec<Vertex>, map: Vec2, offset: Vec2) {
    for x in 0..=map.x as u32 {
        let x = x as f32;
        out.extend(shapes::line(
            world_to_iso(Vec2::new(x, 0.0), offset),
            world_to_iso(Vec2::new(x, map.y), offset),
            1.0,
            palette::GRID,
        ));
    }
    for y in 0..=map.y as u32 {
        let y = y as f32;
        out.extend(shapes::line(
            world_to_iso(Vec2::new(0.0, y), offset),
            world_to_iso(Vec2::new(map.x, y), offset),
            1.0,
            palette::GRID,
        ));
    }
}

/// Shadow, extruded diamond, turret and health bar
fn body(out: &mut Vec<Vertex>, e: &Entity, offset: Vec2, settings: &Settings) {
    let s = world_to_iso(e.pos, offset);
    let kind = e.kind();
    let base = body_color(kind);
    let half_w = BODY_SCALE * e.half_extent.x;
    let z = if kind == EntityKind::Obstacle {
        OBSTACLE_HEIGHT
    } else {
        VEHICLE_HEIGHT
    };

    out.extend(shapes::ellipse(
        s,
        Vec2::new(half_w, half_w * 0.5),
        [0.0, 0.0, 0.0, 0.5],
        shapes::SEGMENTS,
    ));

    let top = flash_color(base, e.hit_flash, settings);
    let left = flash_color(shade(base, -40.0 / 255.0), e.hit_flash, settings);
    let right = flash_color(shade(base, -60.0 / 255.0), e.hit_flash, settings);

    out.extend(shapes::quad(
        Vec2::new(s.x - half_w, s.y - z),
        Vec2::new(s.x, s.y - z + FACE_HALF_HEIGHT),
        Vec2::new(s.x, s.y + FACE_HALF_HEIGHT),
        Vec2::new(s.x - half_w, s.y),
        left,
    ));
    out.extend(shapes::quad(
        Vec2::new(s.x + half_w, s.y - z),
        Vec2::new(s.x, s.y - z + FACE_HALF_HEIGHT),
        Vec2::new(s.x, s.y + FACE_HALF_HEIGHT),
        Vec2::new(s.x + half_w, s.y),
        right,
    ));
    out.extend(shapes::diamond(
        Vec2::new(s.x, s.y - z),
        half_w,
        FACE_HALF_HEIGHT,
        top,
    ));

    let Some(turret) = e.turret() else {
        return;
    };
    let mount = Vec2::new(s.x, s.y - z - 5.0);
    let angle = screen_angle(turret.rotation);
    out.extend(shapes::rotated_rect(
        mount,
        angle,
        Vec2::new(-5.0, -5.0),
        Vec2::new(20.0, 5.0),
        flash_color(shade(base, 40.0 / 255.0), e.hit_flash, settings),
    ));
    out.extend(shapes::rotated_rect(
        mount,
        angle,
        Vec2::new(-10.0, -10.0),
        Vec2::new(10.0, 10.0),
        flash_color(shade(base, 20.0 / 255.0), e.hit_flash, settings),
    ));

    if e.hp < e.max_hp && e.max_hp > 0.0 {
        let fraction = (e.hp / e.max_hp).clamp(0.0, 1.0);
        let corner = Vec2::new(s.x - HEALTH_BAR_WIDTH / 2.0, s.y - z - 30.0);
        out.extend(shapes::rect(corner, Vec2::new(HEALTH_BAR_WIDTH, 4.0), HEALTH_BAR_RED));
        if fraction > 0.0 {
            out.extend(shapes::rect(
                corner,
                Vec2::new(HEALTH_BAR_WIDTH * fraction, 4.0),
                HEALTH_BAR_GREEN,
            ));
        }
    }
}

fn projectile(out: &mut Vec<Vertex>, e: &Entity, allegiance: Allegiance, offset: Vec2) {
    let color = match allegiance {
        Allegiance::Player => palette::PRIMARY,
        Allegiance::Hostile => palette::DANGER,
    };
    let head = world_to_iso(e.pos, offset) - Vec2::new(0.0, MUNITION_HEIGHT);
    let tail = head - project(e.vel) * 0.05;
    out.extend(shapes::line(head, tail, 2.0, with_alpha(color, 0.7)));
    out.extend(shapes::circle(head, 4.0, color, 10));
}

fn smart_munition(out: &mut Vec<Vertex>, e: &Entity, offset: Vec2) {
    let origin = world_to_iso(e.pos, offset) - Vec2::new(0.0, MUNITION_HEIGHT);
    let rot = Vec2::from_angle(screen_angle(e.rotation));
    let local = |x: f32, y: f32| origin + rot.rotate(Vec2::new(x, y));

    out.extend(shapes::circle(origin, 8.0, with_alpha(palette::SMART_MUNITION, 0.25), 12));
    out.extend(shapes::triangle(
        local(10.0, 0.0),
        local(-5.0, 5.0),
        local(-5.0, -5.0),
        palette::SMART_MUNITION,
    ));
    out.extend(shapes::rotated_rect(
        origin,
        screen_angle(e.rotation),
        Vec2::new(-5.0, -2.0),
        Vec2::new(-3.0, 2.0),
        palette::WHITE,
    ));
}

fn particle(out: &mut Vec<Vertex>, p: &Particle, offset: Vec2) {
    let life = p.life_fraction();
    let radius = p.scale * 10.0 * life;
    if radius <= 0.0 {
        return;
    }
    let center = world_to_iso(p.pos, offset) - Vec2::new(0.0, PARTICLE_HEIGHT);
    out.extend(shapes::circle(center, radius, with_alpha(p.color(), life), 8));
}
