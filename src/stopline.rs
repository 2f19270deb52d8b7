// src/stopline.rs
//
// One-shot stop-line crossing detector. A track fires at most once over
// its lifetime: the crossed flag is monotonic and only a full session
// reset (or track eviction) clears it.
//
// The x-span check filters cross traffic whose x never enters the line's
// extent; the y check rejects vehicles still approaching (y grows
// downward, so "past the line" means y at least 1px above the mean line y).

use std::collections::HashSet;
use tracing::info;

use crate::scene::StopLine;
use crate::types::Point;

#[derive(Debug, Default)]
pub struct StoplineGate {
    crossed: HashSet<u64>,
}

impl StoplineGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per track: the first frame its point is inside the
    /// line's x-span and past the line. Marks the track permanently.
    pub fn has_just_crossed(&mut self, track_id: u64, point: Point, line: &StopLine) -> bool {
        if self.crossed.contains(&track_id) {
            return false;
        }

        let (x_min, x_max) = line.x_span();
        if point.x < x_min || point.x > x_max {
            return false;
        }
        if point.y > line.mean_y() - 1.0 {
            return false;
        }

        self.crossed.insert(track_id);
        info!(
            "🚦 track {} crossed stop line at ({:.0}, {:.0})",
            track_id, point.x, point.y
        );
        true
    }

    pub fn has_crossed(&self, track_id: u64) -> bool {
        self.crossed.contains(&track_id)
    }

    /// Drop one track's flag (track lost or evicted).
    pub fn remove(&mut self, track_id: u64) {
        self.crossed.remove(&track_id);
    }

    pub fn reset(&mut self) {
        self.crossed.clear();
    }
}
