// src/engine.rs
//
// The intersection engine: one object owning all per-track and
// configuration state, driven once per frame by the processing loop.
//
// Per-detection flow: trajectory update → zone + trajectory direction →
// fusion → stop-line gate → (on first crossing) the traffic-light rule
// table. The lane guard runs for every detection, independent of the stop
// line. Single consumer, no locking: if scaled to multiple camera streams,
// each stream owns its own engine and track-id namespace.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::fusion;
use crate::lanes;
use crate::lights::TrafficLightBank;
use crate::metrics::EngineMetrics;
use crate::rules;
use crate::scene::SceneConfig;
use crate::stopline::StoplineGate;
use crate::trajectory::{TrajectoryConfig, TrajectoryStore};
use crate::types::{BBox, Detection, Direction, LightColor, Verdict, ViolationKind};
use crate::zones;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trajectory: TrajectoryConfig,
    /// Tracks unseen for this many frames are evicted automatically.
    pub stale_after_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trajectory: TrajectoryConfig::default(),
            stale_after_frames: 300,
        }
    }
}

/// Everything the engine knows about one live track.
#[derive(Debug, Clone)]
pub struct TrackState {
    pub label: String,
    pub bbox: BBox,
    pub direction: Direction,
    pub violations: HashSet<ViolationKind>,
    pub last_seen_frame: u64,
}

/// Per-frame outputs for the external renderer.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Verdicts emitted by stop-line crossings this frame.
    pub verdicts: Vec<Verdict>,
    /// All live tracks currently carrying at least one violation.
    pub in_violation: Vec<u64>,
    /// Cumulative passed-vehicle counts, bucketed by coarse class.
    pub passed_by_class: HashMap<&'static str, u64>,
}

pub struct IntersectionEngine {
    config: EngineConfig,
    scene: SceneConfig,
    reference_angle_deg: f32,
    trajectories: TrajectoryStore,
    gate: StoplineGate,
    bank: TrafficLightBank,
    tracks: HashMap<u64, TrackState>,
    metrics: EngineMetrics,
}

impl IntersectionEngine {
    pub fn new(scene: SceneConfig, config: EngineConfig) -> Result<Self> {
        scene.validate()?;
        let reference_angle_deg = scene.reference_angle_deg();
        let bank = TrafficLightBank::from_lights(&scene.lights);
        info!(
            "🚥 Engine ready: {} lane(s), {} zone(s), {} light(s), ref angle {:.1}°",
            scene.lanes.len(),
            scene.zones.len(),
            scene.lights.len(),
            reference_angle_deg,
        );
        Ok(Self {
            trajectories: TrajectoryStore::new(config.trajectory.clone()),
            gate: StoplineGate::new(),
            bank,
            tracks: HashMap::new(),
            metrics: EngineMetrics::new(),
            reference_angle_deg,
            scene,
            config,
        })
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn track(&self, track_id: u64) -> Option<&TrackState> {
        self.tracks.get(&track_id)
    }

    pub fn lights(&self) -> &TrafficLightBank {
        &self.bank
    }

    /// Feed one sampled light color, by light index in registration order.
    /// Readings may be staler than one frame; the last value holds until
    /// the next refresh.
    pub fn apply_light_reading(&mut self, index: usize, color: LightColor) {
        self.bank.apply_reading(index, color);
    }

    /// One evaluation pass over the current frame's tracker output.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        now: f64,
        detections: &[Detection],
    ) -> FrameResult {
        self.metrics.frames_processed += 1;
        let mut verdicts = Vec::new();

        for det in detections {
            let center = det.bbox.center();

            if !self.tracks.contains_key(&det.track_id) {
                self.metrics.tracks_seen += 1;
                debug!("new track {} ({})", det.track_id, det.label);
            }
            let state = self
                .tracks
                .entry(det.track_id)
                .or_insert_with(|| TrackState {
                    label: det.label.clone(),
                    bbox: det.bbox,
                    direction: Direction::Unknown,
                    violations: HashSet::new(),
                    last_seen_frame: frame_index,
                });
            state.label = det.label.clone();
            state.bbox = det.bbox;
            state.last_seen_frame = frame_index;

            self.trajectories.update(det.track_id, center.x, center.y, now);
            let zone_dir = zones::zone_direction(center, &self.scene.zones);
            let (traj_dir, traj_conf) =
                self.trajectories.classify(det.track_id, self.reference_angle_deg);
            let fused = fusion::fuse(zone_dir, traj_dir, traj_conf);
            state.direction = fused.direction;

            // Lane guard: unconditional, independent of the stop line.
            if !lanes::is_vehicle_allowed(center, &det.label, &self.scene.lanes)
                && state.violations.insert(ViolationKind::RestrictedLane)
            {
                self.metrics.lane_violations += 1;
                warn!(
                    "🚫 track {} ({}) in a lane that does not allow it",
                    det.track_id, det.label
                );
            }

            // Stop-line gate: fires at most once per track, and that one
            // firing is the only trigger for the rule table.
            if let Some(line) = self.scene.stop_line {
                if self.gate.has_just_crossed(det.track_id, center, &line) {
                    self.trajectories
                        .mark_crossing(det.track_id, center.x, center.y, now);
                    self.metrics.record_pass(&det.label);

                    let outcome = rules::evaluate(fused.direction, &self.bank);
                    if outcome.is_violation {
                        state.violations.insert(ViolationKind::RedLight);
                        self.metrics.red_light_violations += 1;
                        warn!(
                            "🚨 VIOLATION track {} ({}) dir={}: {}",
                            det.track_id, det.label, fused.direction, outcome.reason
                        );
                    } else {
                        info!(
                            "✅ track {} ({}) dir={}: {}",
                            det.track_id, det.label, fused.direction, outcome.reason
                        );
                    }
                    verdicts.push(Verdict {
                        track_id: det.track_id,
                        is_violation: outcome.is_violation,
                        reason: outcome.reason,
                        direction: fused.direction,
                    });
                }
            }
        }

        self.evict_stale(frame_index);

        let mut in_violation: Vec<u64> = self
            .tracks
            .iter()
            .filter(|(_, s)| !s.violations.is_empty())
            .map(|(id, _)| *id)
            .collect();
        in_violation.sort_unstable();

        FrameResult {
            verdicts,
            in_violation,
            passed_by_class: self.metrics.passed_by_class().clone(),
        }
    }

    fn evict_stale(&mut self, frame_index: u64) {
        let stale_after = self.config.stale_after_frames;
        let expired: Vec<u64> = self
            .tracks
            .iter()
            .filter(|(_, s)| frame_index.saturating_sub(s.last_seen_frame) > stale_after)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.tracks.remove(&id);
            self.trajectories.remove(id);
            self.gate.remove(id);
            self.metrics.tracks_evicted += 1;
            debug!("🗑️ evicted stale track {}", id);
        }
    }

    /// Full session reset (video loop/seek): clears every per-track map in
    /// one step, so no stale crossed-flag or trajectory survives into the
    /// new session. Configuration and light colors stay.
    pub fn reset(&mut self) {
        self.trajectories.reset();
        self.gate.reset();
        self.tracks.clear();
        info!("🔄 engine reset: all per-track state cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DirectionZone, Lane, TrafficLightRoi};
    use crate::types::{LightKind, Point, VerdictReason};

    fn det(track_id: u64, label: &str, cx: f32, cy: f32) -> Detection {
        Detection {
            track_id,
            label: label.to_string(),
            bbox: BBox {
                x1: cx - 20.0,
                y1: cy - 20.0,
                x2: cx + 20.0,
                y2: cy + 20.0,
            },
            confidence: 0.9,
        }
    }

    /// Stop line across x 200..600 at y≈400, reference vector pointing up
    /// (traffic flows bottom to top), one circular light.
    fn scene_with_light(color: LightColor) -> SceneConfig {
        let mut scene = SceneConfig::default();
        scene.set_stop_line(Point::new(200.0, 400.0), Point::new(600.0, 400.0));
        scene.set_reference_vector(Point::new(400.0, 500.0), Point::new(400.0, 100.0));
        scene.add_light(TrafficLightRoi {
            x1: 100.0,
            y1: 50.0,
            x2: 120.0,
            y2: 110.0,
            kind: LightKind::Circular,
            color,
        });
        scene
    }

    fn engine(scene: SceneConfig) -> IntersectionEngine {
        IntersectionEngine::new(scene, EngineConfig::default()).unwrap()
    }

    /// Drive a track straight up through the stop line, one frame at a
    /// time, returning all verdicts emitted.
    fn drive_straight_through(eng: &mut IntersectionEngine, id: u64, frames: u64) -> Vec<Verdict> {
        let mut verdicts = Vec::new();
        for f in 0..frames {
            let y = 560.0 - 30.0 * f as f32;
            let result = eng.process_frame(f, f as f64 * 0.1, &[det(id, "car", 400.0, y)]);
            verdicts.extend(result.verdicts);
        }
        verdicts
    }

    #[test]
    fn test_straight_through_red_is_violation() {
        let mut eng = engine(scene_with_light(LightColor::Red));
        let verdicts = drive_straight_through(&mut eng, 1, 10);
        assert_eq!(verdicts.len(), 1, "exactly one verdict per crossing");
        let v = &verdicts[0];
        assert!(v.is_violation);
        assert_eq!(v.direction, Direction::Straight);
        assert_eq!(v.reason, VerdictReason::CircularRed);
        assert_eq!(eng.metrics().red_light_violations, 1);
        assert_eq!(eng.metrics().passed_by_class()["car"], 1);
    }

    #[test]
    fn test_straight_through_green_is_allowed() {
        let mut eng = engine(scene_with_light(LightColor::Green));
        let verdicts = drive_straight_through(&mut eng, 1, 10);
        assert_eq!(verdicts.len(), 1);
        assert!(!verdicts[0].is_violation);
        assert_eq!(verdicts[0].reason, VerdictReason::CircularGreen);
    }

    #[test]
    fn test_right_turn_on_red_allowed() {
        let mut eng = engine(scene_with_light(LightColor::Red));
        // Up-left on screen: with the up reference this is a right turn by
        // the relative-angle sign convention.
        let mut verdicts = Vec::new();
        for f in 0..8u64 {
            let cx = 600.0 - 30.0 * f as f32;
            let cy = 500.0 - 30.0 * f as f32;
            let r = eng.process_frame(f, f as f64 * 0.1, &[det(7, "car", cx, cy)]);
            verdicts.extend(r.verdicts);
        }
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].direction, Direction::Right);
        assert!(!verdicts[0].is_violation);
        assert_eq!(verdicts[0].reason, VerdictReason::RightOnRedAllowed);
    }

    #[test]
    fn test_crossing_with_unknown_direction_gets_benefit() {
        let mut eng = engine(scene_with_light(LightColor::Red));
        // The track appears right at the line: too little history for a
        // direction when the gate fires.
        let r1 = eng.process_frame(0, 0.0, &[det(3, "car", 400.0, 420.0)]);
        assert!(r1.verdicts.is_empty());
        let r2 = eng.process_frame(1, 0.1, &[det(3, "car", 400.0, 395.0)]);
        assert_eq!(r2.verdicts.len(), 1);
        assert_eq!(r2.verdicts[0].direction, Direction::Unknown);
        assert!(!r2.verdicts[0].is_violation);
        assert!(r2.in_violation.is_empty());
    }

    #[test]
    fn test_light_reading_changes_outcome() {
        let mut eng = engine(scene_with_light(LightColor::Red));
        eng.apply_light_reading(0, LightColor::Green);
        let verdicts = drive_straight_through(&mut eng, 1, 10);
        assert!(!verdicts[0].is_violation);
    }

    #[test]
    fn test_lane_guard_independent_of_stop_line() {
        // No stop line at all: lane violations must still be detected.
        let mut scene = SceneConfig::default();
        scene
            .add_lane(Lane {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(200.0, 0.0),
                    Point::new(200.0, 200.0),
                    Point::new(0.0, 200.0),
                ],
                label: "car lane".to_string(),
                allowed_labels: vec!["car".to_string()],
            })
            .unwrap();
        let mut eng = engine(scene);

        let r = eng.process_frame(0, 0.0, &[det(5, "motorbike", 100.0, 100.0)]);
        assert_eq!(r.in_violation, vec![5]);
        assert_eq!(eng.metrics().lane_violations, 1);
        assert!(r.verdicts.is_empty(), "no stop line, no rule evaluation");

        // Counted once, not every frame.
        eng.process_frame(1, 0.1, &[det(5, "motorbike", 105.0, 100.0)]);
        assert_eq!(eng.metrics().lane_violations, 1);
    }

    #[test]
    fn test_zone_direction_used_before_trajectory_settles() {
        // A left-only zone right at the line: the gate fires while the
        // trajectory confidence is still low, so the zone's intent decides.
        let mut scene = scene_with_light(LightColor::Red);
        scene
            .add_zone(DirectionZone {
                name: "left pocket".to_string(),
                points: vec![
                    Point::new(300.0, 300.0),
                    Point::new(500.0, 300.0),
                    Point::new(500.0, 450.0),
                    Point::new(300.0, 450.0),
                ],
                allowed_directions: vec![Direction::Left],
                primary_direction: Direction::Left,
            })
            .unwrap();
        // No left arrow configured → circular red governs the left turn.
        let mut eng = engine(scene);
        let r1 = eng.process_frame(0, 0.0, &[det(9, "car", 400.0, 420.0)]);
        assert!(r1.verdicts.is_empty());
        let r2 = eng.process_frame(1, 0.1, &[det(9, "car", 400.0, 395.0)]);
        assert_eq!(r2.verdicts.len(), 1);
        assert_eq!(r2.verdicts[0].direction, Direction::Left);
        assert!(r2.verdicts[0].is_violation);
        assert_eq!(r2.verdicts[0].reason, VerdictReason::CircularRed);
    }

    #[test]
    fn test_reset_clears_crossed_flags_and_trajectories() {
        let mut eng = engine(scene_with_light(LightColor::Red));
        assert_eq!(drive_straight_through(&mut eng, 1, 10).len(), 1);
        eng.reset();
        // Same track id after a video loop: counts again.
        assert_eq!(drive_straight_through(&mut eng, 1, 10).len(), 1);
        assert_eq!(eng.metrics().stopline_crossings, 2);
    }

    #[test]
    fn test_stale_tracks_evicted() {
        let mut eng = IntersectionEngine::new(
            scene_with_light(LightColor::Red),
            EngineConfig {
                stale_after_frames: 5,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        eng.process_frame(0, 0.0, &[det(1, "car", 400.0, 500.0)]);
        assert!(eng.track(1).is_some());
        // Frames pass without the track.
        for f in 1..8 {
            eng.process_frame(f, f as f64 * 0.1, &[]);
        }
        assert!(eng.track(1).is_none());
        assert_eq!(eng.metrics().tracks_evicted, 1);
    }

    #[test]
    fn test_no_lights_scene_never_flags_red_light() {
        let mut scene = SceneConfig::default();
        scene.set_stop_line(Point::new(200.0, 400.0), Point::new(600.0, 400.0));
        scene.set_reference_vector(Point::new(400.0, 500.0), Point::new(400.0, 100.0));
        let mut eng = engine(scene);
        let verdicts = drive_straight_through(&mut eng, 1, 10);
        assert_eq!(verdicts.len(), 1);
        assert!(!verdicts[0].is_violation);
        assert_eq!(verdicts[0].reason, VerdictReason::NotConfigured);
    }
}
