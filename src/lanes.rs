// src/lanes.rs
//
// Restricted-lane membership check. Independent of the stop line: it runs
// for every detection on every frame.

use crate::geometry::point_in_polygon;
use crate::scene::{Lane, ALL_VEHICLES};
use crate::types::Point;

/// Index of the first lane polygon containing the point (same first-match
/// tie-break as the zone classifier).
pub fn find_lane(point: Point, lanes: &[Lane]) -> Option<usize> {
    lanes
        .iter()
        .position(|lane| point_in_polygon(point, &lane.points))
}

/// Whether a vehicle of `vehicle_label` may be where it is. Points outside
/// every lane are unrestricted.
pub fn is_vehicle_allowed(point: Point, vehicle_label: &str, lanes: &[Lane]) -> bool {
    match find_lane(point, lanes) {
        Some(idx) => {
            let allowed = &lanes[idx].allowed_labels;
            allowed.iter().any(|l| l == ALL_VEHICLES || l == vehicle_label)
        }
        None => true,
    }
}
