// src/geometry.rs
//
// Pixel-space geometry helpers shared by the zone classifier, lane guard
// and stop-line gate. Everything works on image coordinates (y grows
// downward), matching the detector output.

use crate::types::Point;

/// Even-odd point-in-polygon test, boundary inclusive.
///
/// A point lying exactly on an edge counts as inside. Degenerate polygons
/// (< 3 points) never contain anything; they are rejected at config-load
/// time anyway.
pub fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    if poly.len() < 3 {
        return false;
    }

    // Boundary check first so edge hits are deterministic.
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        if point_to_segment_distance(p, a, b) < 1e-4 {
            return true;
        }
    }

    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from a point to a line segment.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx == 0.0 && dy == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
    let nx = a.x + t * dx;
    let ny = a.y + t * dy;
    ((p.x - nx).powi(2) + (p.y - ny).powi(2)).sqrt()
}

/// Angle of the vector a→b in degrees, atan2 convention (0° = +x, 90° = down).
pub fn segment_angle_deg(a: Point, b: Point) -> f32 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Normalize an angle in degrees to (-180, 180].
pub fn normalize_angle_deg(mut angle: f32) -> f32 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}
