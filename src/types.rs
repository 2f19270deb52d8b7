use serde::{Deserialize, Serialize};

/// Maneuver direction assigned to a tracked vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Straight,
    Right,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Straight => "straight",
            Self::Right => "right",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Color reported by the external light sampler. `Unknown` is a no-signal
/// value, not a fault — it never resolves a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red,
    Yellow,
    Green,
    Unknown,
}

impl LightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Unknown => "unknown",
        }
    }
}

/// What maneuver a signal head governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Circular,
    StraightArrow,
    LeftArrow,
    RightArrow,
}

impl LightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::StraightArrow => "straight_arrow",
            Self::LeftArrow => "left_arrow",
            Self::RightArrow => "right_arrow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box from the upstream detector, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, self.y2)
    }
}

/// One tracked vehicle observation for the current frame, as delivered by
/// the external detector+tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub track_id: u64,
    pub label: String,
    pub bbox: BBox,
    pub confidence: f32,
}

/// Which kind of restriction a track has broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    RedLight,
    RestrictedLane,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedLight => "RED_LIGHT",
            Self::RestrictedLane => "RESTRICTED_LANE",
        }
    }
}

/// The rule that resolved a stop-line crossing, reported alongside the
/// verdict so downstream consumers can explain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictReason {
    NotConfigured,
    RightArrowGreen,
    RightArrowRed,
    RightOnRedAllowed,
    LeftArrowGreen,
    LeftArrowRed,
    StraightArrowGreen,
    StraightArrowRed,
    CircularGreen,
    CircularRed,
    StraightFallbackGreen,
    StraightFallbackRed,
    UnknownDirectionGreen,
    UnknownDirectionBenefit,
    Inconclusive,
}

impl VerdictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "no lights configured",
            Self::RightArrowGreen => "green right arrow",
            Self::RightArrowRed => "red right arrow",
            Self::RightOnRedAllowed => "right turn allowed on red",
            Self::LeftArrowGreen => "green left arrow",
            Self::LeftArrowRed => "red left arrow",
            Self::StraightArrowGreen => "green straight arrow",
            Self::StraightArrowRed => "red straight arrow",
            Self::CircularGreen => "green circular light",
            Self::CircularRed => "red circular light",
            Self::StraightFallbackGreen => "green straight arrow (governs left)",
            Self::StraightFallbackRed => "red straight arrow (governs left)",
            Self::UnknownDirectionGreen => "direction unknown, green light present",
            Self::UnknownDirectionBenefit => "direction unknown, benefit of the doubt",
            Self::Inconclusive => "inconclusive light state",
        }
    }
}

impl std::fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one stop-line crossing evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub track_id: u64,
    pub is_violation: bool,
    pub reason: VerdictReason,
    pub direction: Direction,
}
