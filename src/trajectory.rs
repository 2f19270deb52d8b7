// src/trajectory.rs
//
// Bounded per-track position history and trajectory-based direction
// inference.
//
// The classifier measures the displacement vector from the oldest to the
// newest sample in the window, expresses its angle relative to the
// calibrated "straight ahead" angle, and buckets it into left / straight /
// right. Small lateral displacement in the 25°-60° band still counts as
// straight — tracker jitter on a slow vehicle can swing the angle wildly
// while the vehicle barely moves sideways.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::geometry::normalize_angle_deg;
use crate::types::Direction;

/// One recorded position. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub x: f32,
    pub y: f32,
    /// Seconds. Monotonic within a window (out-of-order inputs are clamped).
    pub t: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Hard cap on samples per track.
    pub window_capacity: usize,
    /// Rolling time budget; samples older than this are pruned.
    pub time_window_secs: f64,
    /// Minimum samples before a direction can be inferred.
    pub min_samples: usize,
    /// Minimum first-to-last displacement magnitude (px) to call it motion.
    pub min_displacement_px: f32,
    /// |relative angle| at or below this is straight.
    pub straight_angle_deg: f32,
    /// |relative angle| above this is an unambiguous turn.
    pub turn_angle_deg: f32,
    /// In the ambiguous band, |dx| at or below this falls back to straight.
    pub min_lateral_px: f32,
    /// How long a stop-line crossing anchor stays in effect.
    pub reanchor_window_secs: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            window_capacity: 10,
            time_window_secs: 2.0,
            min_samples: 5,
            min_displacement_px: 30.0,
            straight_angle_deg: 25.0,
            turn_angle_deg: 60.0,
            min_lateral_px: 20.0,
            reanchor_window_secs: 2.0,
        }
    }
}

/// Per-track bounded position history plus the direction classifier.
pub struct TrajectoryStore {
    config: TrajectoryConfig,
    windows: HashMap<u64, VecDeque<PositionSample>>,
    /// Crossing anchors: while fresh, displacement is measured from the
    /// crossing point instead of the oldest window sample, so the inferred
    /// direction reflects motion after the stop line, not stale approach
    /// history.
    anchors: HashMap<u64, PositionSample>,
}

impl TrajectoryStore {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
            anchors: HashMap::new(),
        }
    }

    /// Append a sample for a track, evicting beyond the capacity and time
    /// budget. A timestamp earlier than the last sample is clamped to it.
    pub fn update(&mut self, track_id: u64, x: f32, y: f32, now: f64) {
        let window = self.windows.entry(track_id).or_default();

        let t = match window.back() {
            Some(last) if now < last.t => last.t,
            _ => now,
        };
        window.push_back(PositionSample { x, y, t });

        while window.len() > self.config.window_capacity {
            window.pop_front();
        }
        let cutoff = t - self.config.time_window_secs;
        while window.front().map_or(false, |s| s.t < cutoff) {
            window.pop_front();
        }
    }

    /// Record the point where a track crossed the stop line. For the next
    /// `reanchor_window_secs` the classifier measures displacement from here.
    pub fn mark_crossing(&mut self, track_id: u64, x: f32, y: f32, now: f64) {
        debug!("📍 track {} re-anchored at ({:.0}, {:.0})", track_id, x, y);
        self.anchors.insert(track_id, PositionSample { x, y, t: now });
    }

    /// Infer the direction of a track relative to `reference_angle_deg`.
    ///
    /// Returns `(Unknown, 0.0)` when there is not enough history or not
    /// enough motion; that is the expected state for a fresh track, not a
    /// fault.
    pub fn classify(&mut self, track_id: u64, reference_angle_deg: f32) -> (Direction, f32) {
        let window = match self.windows.get(&track_id) {
            Some(w) => w,
            None => return (Direction::Unknown, 0.0),
        };
        if window.len() < self.config.min_samples {
            return (Direction::Unknown, 0.0);
        }

        // These unwraps cannot fail: min_samples >= 1 was just checked.
        let last = *window.back().unwrap();
        let first = *window.front().unwrap();

        // Prefer a fresh crossing anchor as the start point.
        let start = match self.anchors.get(&track_id) {
            Some(anchor) if last.t - anchor.t <= self.config.reanchor_window_secs => *anchor,
            Some(_) => {
                self.anchors.remove(&track_id);
                first
            }
            None => first,
        };

        let dx = last.x - start.x;
        let dy = last.y - start.y;
        let displacement = (dx * dx + dy * dy).sqrt();
        if displacement < self.config.min_displacement_px {
            return (Direction::Unknown, 0.0);
        }

        let angle = dy.atan2(dx).to_degrees();
        let relative = normalize_angle_deg(angle - reference_angle_deg);
        let abs_rel = relative.abs();

        // Negative relative angle = clockwise from straight = right turn.
        let direction = if abs_rel <= self.config.straight_angle_deg {
            Direction::Straight
        } else if abs_rel <= self.config.turn_angle_deg {
            // Ambiguous band: require real lateral displacement, otherwise
            // treat as jitter and keep straight.
            if dx.abs() <= self.config.min_lateral_px {
                Direction::Straight
            } else if relative < 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if relative < 0.0 {
            Direction::Right
        } else {
            Direction::Left
        };

        let mut confidence =
            (window.len() as f32 / self.config.window_capacity as f32).min(1.0);
        if abs_rel < self.config.straight_angle_deg / 2.0 {
            // Near-zero angles are less decisive between straight and a
            // shallow turn just beginning.
            confidence *= 0.8;
        }

        (direction, confidence)
    }

    pub fn sample_count(&self, track_id: u64) -> usize {
        self.windows.get(&track_id).map_or(0, |w| w.len())
    }

    /// Drop all state for one track (track lost or evicted).
    pub fn remove(&mut self, track_id: u64) {
        self.windows.remove(&track_id);
        self.anchors.remove(&track_id);
    }

    pub fn reset(&mut self) {
        self.windows.clear();
        self.anchors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TrajectoryStore {
        TrajectoryStore::new(TrajectoryConfig::default())
    }

    /// Feed a straight-line trajectory from (x0, y0) stepping (dx, dy) per
    /// sample at 10 samples/sec.
    fn feed(store: &mut TrajectoryStore, id: u64, x0: f32, y0: f32, dx: f32, dy: f32, n: usize) {
        for i in 0..n {
            store.update(
                id,
                x0 + dx * i as f32,
                y0 + dy * i as f32,
                i as f64 * 0.1,
            );
        }
    }

    #[test]
    fn test_too_few_samples_is_unknown() {
        let mut s = store();
        feed(&mut s, 1, 0.0, 0.0, 0.0, 20.0, 4);
        assert_eq!(s.classify(1, 90.0), (Direction::Unknown, 0.0));
    }

    #[test]
    fn test_unseen_track_is_unknown() {
        let mut s = store();
        assert_eq!(s.classify(42, 90.0), (Direction::Unknown, 0.0));
    }

    #[test]
    fn test_small_displacement_is_unknown() {
        let mut s = store();
        // 8 samples but total displacement under 30px.
        feed(&mut s, 1, 100.0, 100.0, 0.0, 3.0, 8);
        let (dir, conf) = s.classify(1, 90.0);
        assert_eq!(dir, Direction::Unknown);
        assert_eq!(conf, 0.0);
    }

    #[test]
    fn test_downward_motion_is_straight() {
        let mut s = store();
        feed(&mut s, 1, 320.0, 100.0, 0.0, 20.0, 8);
        let (dir, conf) = s.classify(1, 90.0);
        assert_eq!(dir, Direction::Straight);
        assert!(conf > 0.0);
    }

    #[test]
    fn test_hard_left_and_right() {
        let mut s = store();
        // Moving in +x (angle 0°), reference 90° → relative -90° → right.
        feed(&mut s, 1, 100.0, 300.0, 20.0, 0.0, 8);
        assert_eq!(s.classify(1, 90.0).0, Direction::Right);
        // Moving in -x (angle 180°), relative +90° → left.
        feed(&mut s, 2, 500.0, 300.0, -20.0, 0.0, 8);
        assert_eq!(s.classify(2, 90.0).0, Direction::Left);
    }

    #[test]
    fn test_translation_invariance() {
        let mut s = store();
        feed(&mut s, 1, 0.0, 0.0, 12.0, 16.0, 8);
        feed(&mut s, 2, 5000.0, -300.0, 12.0, 16.0, 8);
        assert_eq!(s.classify(1, 90.0), s.classify(2, 90.0));
    }

    #[test]
    fn test_reference_flip_swaps_left_right() {
        let mut s = store();
        feed(&mut s, 1, 100.0, 300.0, 20.0, 0.0, 8);
        let (with_ref, _) = s.classify(1, 90.0);
        let (flipped, _) = s.classify(1, -90.0);
        assert_eq!(with_ref, Direction::Right);
        assert_eq!(flipped, Direction::Left);
    }

    #[test]
    fn test_ambiguous_band_lateral_fallback() {
        let mut s = store();
        // Total displacement (18, 31.2): angle ≈ 60.0°, relative ≈ -30°,
        // inside the ambiguous band. |dx| = 18 ≤ 20 → jitter, straight.
        for i in 0..8 {
            s.update(
                1,
                100.0 + 18.0 * i as f32 / 7.0,
                100.0 + 31.2 * i as f32 / 7.0,
                i as f64 * 0.1,
            );
        }
        assert_eq!(s.classify(1, 90.0).0, Direction::Straight);

        // Same angle with twice the lateral motion classifies as a turn.
        for i in 0..8 {
            s.update(
                2,
                100.0 + 36.0 * i as f32 / 7.0,
                100.0 + 62.4 * i as f32 / 7.0,
                i as f64 * 0.1,
            );
        }
        assert_eq!(s.classify(2, 90.0).0, Direction::Right);
    }

    #[test]
    fn test_window_capped_at_ten() {
        let mut s = store();
        feed(&mut s, 1, 0.0, 0.0, 0.0, 10.0, 50);
        assert!(s.sample_count(1) <= 10);
    }

    #[test]
    fn test_time_budget_prunes_old_samples() {
        let mut s = store();
        s.update(1, 0.0, 0.0, 0.0);
        s.update(1, 0.0, 10.0, 0.5);
        // A sample 5s later pushes everything else out of the 2s budget.
        s.update(1, 0.0, 500.0, 5.0);
        assert_eq!(s.sample_count(1), 1);
    }

    #[test]
    fn test_out_of_order_timestamp_clamped() {
        let mut s = store();
        s.update(1, 0.0, 0.0, 1.0);
        s.update(1, 0.0, 10.0, 0.2); // goes backwards
        // Both samples kept, window still ordered (clamped to 1.0).
        assert_eq!(s.sample_count(1), 2);
    }

    #[test]
    fn test_crossing_anchor_overrides_stale_history() {
        let mut s = store();
        // Approach: strong leftward drift before the line.
        for i in 0..10 {
            s.update(1, 500.0 - 25.0 * i as f32, 100.0 + 15.0 * i as f32, i as f64 * 0.1);
        }
        // Crossing at the last position; afterwards the vehicle goes
        // straight down. Half the window is still approach history, which
        // without the anchor would classify as a left turn.
        s.mark_crossing(1, 275.0, 235.0, 0.9);
        for i in 10..15 {
            s.update(1, 275.0, 235.0 + 20.0 * (i - 9) as f32, i as f64 * 0.1);
        }
        let (dir, _) = s.classify(1, 90.0);
        assert_eq!(dir, Direction::Straight);
    }

    #[test]
    fn test_expired_anchor_is_dropped() {
        let mut s = store();
        s.mark_crossing(1, 100.0, 100.0, 0.0);
        // Samples well past the 2s re-anchor window.
        for i in 0..8 {
            s.update(1, 100.0 + 20.0 * i as f32, 100.0, 5.0 + i as f64 * 0.1);
        }
        // Anchor expired → displacement from window start; still a right
        // turn here, but the anchor map must have been cleaned up.
        let _ = s.classify(1, 90.0);
        assert!(s.anchors.get(&1).is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = store();
        feed(&mut s, 1, 0.0, 0.0, 0.0, 20.0, 8);
        s.mark_crossing(1, 0.0, 140.0, 0.7);
        s.reset();
        assert_eq!(s.sample_count(1), 0);
        assert_eq!(s.classify(1, 90.0), (Direction::Unknown, 0.0));
    }
}
