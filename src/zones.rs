// src/zones.rs
//
// Direction-zone membership. A zone is a polygon annotated with the turn
// directions that are legal from it; the primary direction is what the
// fusion step treats as the zone's nominal intent.

use crate::geometry::point_in_polygon;
use crate::scene::DirectionZone;
use crate::types::{Direction, Point};

/// Index of the first zone containing the point, by registration order.
///
/// Overlapping zones are legal; first match winning is the defined
/// tie-break, not an error.
pub fn classify(point: Point, zones: &[DirectionZone]) -> Option<usize> {
    zones
        .iter()
        .position(|zone| point_in_polygon(point, &zone.points))
}

/// The nominal direction for a point, if it sits in any zone.
pub fn zone_direction(point: Point, zones: &[DirectionZone]) -> Option<Direction> {
    classify(point, zones).map(|idx| zones[idx].primary_direction)
}

/// Whether a fused direction is legal for the zone the point is in.
/// Outside every zone there is no restriction.
pub fn is_direction_allowed(point: Point, direction: Direction, zones: &[DirectionZone]) -> bool {
    if direction == Direction::Unknown {
        return true;
    }
    match classify(point, zones) {
        Some(idx) => zones[idx].allowed_directions.contains(&direction),
        None => true,
    }
}
