// src/lib.rs
//
// Red-light / restricted-lane violation decision core.
//
// Signal flow per frame:
//   Tracker output → trajectory store ─┬→ trajectory direction ┐
//   Scene zones ───────────────────────┴→ zone direction ──────┼→ fusion
//   Fused direction + light bank → stop-line gate → rule table → verdict
//   Lane guard runs for every detection, independent of the gate.
//
// Video decode, detection/tracking and light color sampling are external
// collaborators; this crate consumes their outputs through `Detection`
// and `apply_light_reading`.

pub mod config;
pub mod engine;
pub mod fusion;
pub mod geometry;
pub mod lanes;
pub mod lights;
pub mod metrics;
pub mod rules;
pub mod scene;
pub mod stopline;
pub mod trajectory;
pub mod types;
pub mod zones;

// Re-exports for ergonomic access from binaries and tests.
pub use engine::{EngineConfig, FrameResult, IntersectionEngine, TrackState};
pub use fusion::{fuse, DirectionSource, FusedDirection};
pub use lights::TrafficLightBank;
pub use scene::{DirectionZone, Lane, ReferenceVector, SceneConfig, StopLine, TrafficLightRoi};
pub use trajectory::{TrajectoryConfig, TrajectoryStore};
pub use types::{
    BBox, Detection, Direction, LightColor, LightKind, Point, Verdict, VerdictReason,
    ViolationKind,
};
