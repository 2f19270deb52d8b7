// src/scene.rs
//
// The scene configuration document: lanes, direction zones, traffic light
// ROIs, the stop line and the reference vector. Owned by an external
// configuration tool, loaded wholesale at session start and mutated only
// through the explicit add/remove operations below.
//
// Validation happens once at load/add time so the per-frame decision path
// never has to re-check polygons.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::geometry::segment_angle_deg;
use crate::types::{Direction, LightColor, LightKind, Point};

/// Canonical "straight ahead" angle used when no reference vector is
/// calibrated: 90° in atan2 image coordinates, i.e. straight down.
pub const DEFAULT_REFERENCE_ANGLE_DEG: f32 = 90.0;

/// Sentinel label meaning a lane accepts every vehicle type.
pub const ALL_VEHICLES: &str = "all";

/// A restricted lane: polygon plus the vehicle labels allowed inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub points: Vec<Point>,
    #[serde(default)]
    pub label: String,
    pub allowed_labels: Vec<String>,
}

/// The single stop line a vehicle must cross before a red-light check runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLine {
    pub p1: Point,
    pub p2: Point,
}

impl StopLine {
    /// Horizontal extent of the line, min to max.
    pub fn x_span(&self) -> (f32, f32) {
        (self.p1.x.min(self.p2.x), self.p1.x.max(self.p2.x))
    }

    /// Mean y of the endpoints, used as the crossing threshold.
    pub fn mean_y(&self) -> f32 {
        (self.p1.y + self.p2.y) / 2.0
    }
}

/// Rectangle ROI of one signal head plus its last sampled color.
///
/// The color is externally supplied and possibly stale between refresh
/// cycles; the rule table treats stale/unknown as no-signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficLightRoi {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub kind: LightKind,
    #[serde(default = "unknown_color")]
    pub color: LightColor,
}

fn unknown_color() -> LightColor {
    LightColor::Unknown
}

/// A polygon labeling which turn directions are legal for vehicles inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionZone {
    #[serde(default)]
    pub name: String,
    pub points: Vec<Point>,
    pub allowed_directions: Vec<Direction>,
    pub primary_direction: Direction,
}

/// Two points calibrating the canonical "straight ahead" direction for the
/// camera framing. Absent means the 90° (downward) default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceVector {
    pub p1: Point,
    pub p2: Point,
}

impl ReferenceVector {
    pub fn angle_deg(&self) -> f32 {
        segment_angle_deg(self.p1, self.p2)
    }
}

/// Everything the decision core needs to know about one camera scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub stop_line: Option<StopLine>,
    #[serde(default)]
    pub lights: Vec<TrafficLightRoi>,
    #[serde(default)]
    pub zones: Vec<DirectionZone>,
    #[serde(default)]
    pub reference_vector: Option<ReferenceVector>,
}

impl SceneConfig {
    /// Load and validate a scene document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading scene config {}", path.display()))?;
        let scene: SceneConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing scene config {}", path.display()))?;
        scene.validate()?;
        info!(
            "📂 Scene loaded: {} lane(s), {} light(s), {} zone(s), stop line: {}",
            scene.lanes.len(),
            scene.lights.len(),
            scene.zones.len(),
            if scene.stop_line.is_some() { "yes" } else { "no" },
        );
        Ok(scene)
    }

    /// Write the scene document to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("writing scene config {}", path.display()))?;
        Ok(())
    }

    /// Reject malformed entities up front. Polygons need ≥ 3 points and
    /// allowed-sets must be non-empty; evaluation code relies on both.
    pub fn validate(&self) -> Result<()> {
        for (i, lane) in self.lanes.iter().enumerate() {
            if lane.points.len() < 3 {
                bail!("lane {} has {} points, need at least 3", i, lane.points.len());
            }
            if lane.allowed_labels.is_empty() {
                bail!("lane {} has an empty allowed-labels set", i);
            }
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.points.len() < 3 {
                bail!("zone {} has {} points, need at least 3", i, zone.points.len());
            }
            if zone.allowed_directions.is_empty() {
                bail!("zone {} has an empty allowed-directions set", i);
            }
        }
        Ok(())
    }

    /// Effective reference angle: calibrated vector if present, else the
    /// 90° downward default. A missing vector is not an error.
    pub fn reference_angle_deg(&self) -> f32 {
        self.reference_vector
            .map(|v| v.angle_deg())
            .unwrap_or(DEFAULT_REFERENCE_ANGLE_DEG)
    }

    pub fn add_lane(&mut self, lane: Lane) -> Result<usize> {
        if lane.points.len() < 3 {
            bail!("lane polygon needs at least 3 points, got {}", lane.points.len());
        }
        if lane.allowed_labels.is_empty() {
            bail!("lane allowed-labels set must not be empty");
        }
        self.lanes.push(lane);
        Ok(self.lanes.len() - 1)
    }

    pub fn remove_lane(&mut self, index: usize) -> bool {
        if index < self.lanes.len() {
            self.lanes.remove(index);
            true
        } else {
            false
        }
    }

    pub fn add_zone(&mut self, zone: DirectionZone) -> Result<usize> {
        if zone.points.len() < 3 {
            bail!("zone polygon needs at least 3 points, got {}", zone.points.len());
        }
        if zone.allowed_directions.is_empty() {
            bail!("zone allowed-directions set must not be empty");
        }
        self.zones.push(zone);
        Ok(self.zones.len() - 1)
    }

    pub fn remove_zone(&mut self, index: usize) -> bool {
        if index < self.zones.len() {
            self.zones.remove(index);
            true
        } else {
            false
        }
    }

    pub fn add_light(&mut self, light: TrafficLightRoi) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn remove_light(&mut self, index: usize) -> bool {
        if index < self.lights.len() {
            self.lights.remove(index);
            true
        } else {
            false
        }
    }

    /// The scene has at most one stop line; setting a new one replaces it.
    pub fn set_stop_line(&mut self, p1: Point, p2: Point) {
        self.stop_line = Some(StopLine { p1, p2 });
    }

    pub fn clear_stop_line(&mut self) {
        self.stop_line = None;
    }

    pub fn set_reference_vector(&mut self, p1: Point, p2: Point) {
        self.reference_vector = Some(ReferenceVector { p1, p2 });
    }
}
