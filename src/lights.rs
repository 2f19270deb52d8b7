// src/lights.rs
//
// Queryable snapshot of the traffic-light bank. Colors come from an
// external sampler at a caller-chosen cadence (the reference deployment
// refreshes roughly every 10th frame), so any color may be stale; the rule
// table treats staleness the same as an unknown reading.

use tracing::{debug, warn};

use crate::scene::TrafficLightRoi;
use crate::types::{LightColor, LightKind};

/// One signal head's current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub kind: LightKind,
    pub color: LightColor,
}

/// All configured lights in registration order.
#[derive(Debug, Clone, Default)]
pub struct TrafficLightBank {
    states: Vec<LightState>,
}

impl TrafficLightBank {
    /// Build the bank from the scene's light ROIs, keeping any last-known
    /// colors the document carried.
    pub fn from_lights(lights: &[TrafficLightRoi]) -> Self {
        Self {
            states: lights
                .iter()
                .map(|l| LightState {
                    kind: l.kind,
                    color: l.color,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Apply one sampled color, by light index in registration order.
    /// Out-of-range indices are logged and dropped; the sampler and the
    /// configuration can briefly disagree while lights are being edited.
    pub fn apply_reading(&mut self, index: usize, color: LightColor) {
        match self.states.get_mut(index) {
            Some(state) => {
                if state.color != color {
                    debug!(
                        "🚥 light {} ({}) {} → {}",
                        index,
                        state.kind.as_str(),
                        state.color.as_str(),
                        color.as_str()
                    );
                }
                state.color = color;
            }
            None => warn!("light reading for unknown index {} dropped", index),
        }
    }

    /// Lights of one kind, registration order preserved.
    pub fn of_kind(&self, kind: LightKind) -> impl Iterator<Item = &LightState> {
        self.states.iter().filter(move |s| s.kind == kind)
    }

    pub fn has_kind(&self, kind: LightKind) -> bool {
        self.states.iter().any(|s| s.kind == kind)
    }

    pub fn any_green(&self) -> bool {
        self.states.iter().any(|s| s.color == LightColor::Green)
    }

    pub fn states(&self) -> &[LightState] {
        &self.states
    }
}
