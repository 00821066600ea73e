//! Tessellation of 2D primitives into triangle lists

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;

/// Default segment count for discs and rings
pub const SEGMENTS: u32 = 16;

/// Filled convex polygon as a triangle fan around its first point
pub fn polygon(points: &[Vec2], color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 3 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((points.len() - 2) * 3);
    for pair in points[1..].windows(2) {
        vertices.push(Vertex::at(points[0], color));
        vertices.push(Vertex::at(pair[0], color));
        vertices.push(Vertex::at(pair[1], color));
    }
    vertices
}

pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![Vertex::at(a, color), Vertex::at(b, color), Vertex::at(c, color)]
}

/// Quad from four corners in winding order
pub fn quad(a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    polygon(&[a, b, c, d], color)
}

/// Axis-aligned rectangle from its top-left corner
pub fn rect(top_left: Vec2, size: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let br = top_left + size;
    quad(
        top_left,
        Vec2::new(br.x, top_left.y),
        br,
        Vec2::new(top_left.x, br.y),
        color,
    )
}

/// Rectangle given in a local frame (`min`..`max`), rotated by `angle` about
/// `origin` and placed there
pub fn rotated_rect(origin: Vec2, angle: f32, min: Vec2, max: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let rot = Vec2::from_angle(angle);
    let corners = [
        min,
        Vec2::new(max.x, min.y),
        max,
        Vec2::new(min.x, max.y),
    ]
    .map(|c| origin + rot.rotate(c));
    polygon(&corners, color)
}

/// Rhombus with the given half-width and half-height (an isometric tile face)
pub fn diamond(center: Vec2, half_width: f32, half_height: f32, color: [f32; 4]) -> Vec<Vertex> {
    quad(
        center + Vec2::new(0.0, -half_height),
        center + Vec2::new(half_width, 0.0),
        center + Vec2::new(0.0, half_height),
        center + Vec2::new(-half_width, 0.0),
        color,
    )
}

/// Filled ellipse
pub fn ellipse(center: Vec2, radii: Vec2, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        vertices.push(Vertex::at(center, color));
        vertices.push(Vertex::at(center + Vec2::from_angle(theta1) * radii, color));
        vertices.push(Vertex::at(center + Vec2::from_angle(theta2) * radii, color));
    }

    vertices
}

/// Filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    ellipse(center, Vec2::splat(radius), color, segments)
}

/// Ring (hollow circle)
pub fn ring(center: Vec2, inner_radius: f32, outer_radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let d1 = Vec2::from_angle((i as f32 / segments as f32) * TAU);
        let d2 = Vec2::from_angle(((i + 1) as f32 / segments as f32) * TAU);

        let inner1 = center + d1 * inner_radius;
        let outer1 = center + d1 * outer_radius;
        let inner2 = center + d2 * inner_radius;
        let outer2 = center + d2 * outer_radius;

        // Two triangles per segment
        vertices.push(Vertex::at(inner1, color));
        vertices.push(Vertex::at(outer1, color));
        vertices.push(Vertex::at(inner2, color));

        vertices.push(Vertex::at(inner2, color));
        vertices.push(Vertex::at(outer1, color));
        vertices.push(Vertex::at(outer2, color));
    }

    vertices
}

/// Line segment of the given pixel width. Degenerate segments produce nothing.
pub fn line(a: Vec2, b: Vec2, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let dir = (b - a).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec::new();
    }
    let perp = dir.perp() * (width * 0.5);
    quad(a + perp, b + perp, b - perp, a - perp, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_triangle_counts() {
        assert_eq!(polygon(&[Vec2::ZERO, Vec2::X], [1.0; 4]).len(), 0);
        assert_eq!(quad(Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y, [1.0; 4]).len(), 6);
        assert_eq!(circle(Vec2::ZERO, 1.0, [1.0; 4], 12).len(), 36);
        assert_eq!(ring(Vec2::ZERO, 1.0, 2.0, [1.0; 4], 8).len(), 48);
    }

    #[test]
    fn test_diamond_extents() {
        let v = diamond(Vec2::new(10.0, 10.0), 16.0, 8.0, [1.0; 4]);
        let xs: Vec<f32> = v.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = v.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -6.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 26.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 2.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 18.0);
    }

    #[test]
    fn test_line_width() {
        let v = line(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, [1.0; 4]);
        assert_eq!(v.len(), 6);
        assert!(v.iter().all(|v| v.position[1].abs() <= 1.0 + 1e-6));
        assert!(line(Vec2::ONE, Vec2::ONE, 2.0, [1.0; 4]).is_empty());
    }

    #[test]
    fn test_rotated_rect_quarter_turn() {
        let v = rotated_rect(
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_2,
            Vec2::new(0.0, -1.0),
            Vec2::new(10.0, 1.0),
            [1.0; 4],
        );
        // Barrel pointing along +x now points along +y
        let max_y = v.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 10.0).abs() < 1e-4);
    }
}
