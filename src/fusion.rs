// src/fusion.rs
//
// Reconciles the zone-derived direction (nominal intent of the lane the
// vehicle sits in) with the trajectory-derived direction (what the vehicle
// actually did). Under high trajectory confidence, observed motion
// overrides nominal intent; under low confidence the zone wins and the
// disagreement is flagged for diagnostics.

use tracing::{debug, warn};

use crate::types::Direction;

/// Which input decided the fused direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSource {
    None,
    Zone,
    Trajectory,
    Both,
}

impl DirectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zone => "zone",
            Self::Trajectory => "trajectory",
            Self::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedDirection {
    pub direction: Direction,
    pub source: DirectionSource,
    pub conflict: bool,
}

/// Trajectory confidence at or above this is trusted over the zone.
pub const MIN_TRAJECTORY_CONFIDENCE: f32 = 0.5;

pub fn fuse(
    zone_direction: Option<Direction>,
    trajectory_direction: Direction,
    trajectory_confidence: f32,
) -> FusedDirection {
    let trajectory = (trajectory_direction != Direction::Unknown).then_some(trajectory_direction);

    match (zone_direction, trajectory) {
        (None, None) => FusedDirection {
            direction: Direction::Unknown,
            source: DirectionSource::None,
            conflict: false,
        },
        (Some(zone), None) => FusedDirection {
            direction: zone,
            source: DirectionSource::Zone,
            conflict: false,
        },
        (None, Some(traj)) => FusedDirection {
            direction: traj,
            source: DirectionSource::Trajectory,
            conflict: false,
        },
        (Some(zone), Some(traj)) => {
            let conflict = zone != traj;
            if trajectory_confidence < MIN_TRAJECTORY_CONFIDENCE {
                debug!(
                    "low trajectory confidence ({:.2}), zone wins: {}",
                    trajectory_confidence, zone
                );
                FusedDirection {
                    direction: zone,
                    source: DirectionSource::Zone,
                    conflict,
                }
            } else if !conflict {
                FusedDirection {
                    direction: zone,
                    source: DirectionSource::Both,
                    conflict: false,
                }
            } else {
                warn!(
                    "⚠️ direction conflict: zone={} trajectory={} (conf={:.2}) → trajectory wins",
                    zone, traj, trajectory_confidence
                );
                FusedDirection {
                    direction: traj,
                    source: DirectionSource::Trajectory,
                    conflict: true,
                }
            }
        }
    }
}
