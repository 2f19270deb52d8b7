// src/metrics.rs
//
// Session counters exposed to external renderers and operators: frames
// processed, stop-line passes bucketed by coarse vehicle class, and
// violation totals. The decision path is single-threaded, so plain
// counters suffice.

use serde::Serialize;
use std::collections::HashMap;

/// Coarse bucket for the passed-vehicle counts. Detector labels are finer
/// grained than operators care about.
pub fn coarse_class(label: &str) -> &'static str {
    match label {
        "car" | "taxi" => "car",
        "bus" => "bus",
        "truck" | "van" | "trailer" => "truck",
        "motorbike" | "motorcycle" | "bicycle" => "two_wheeler",
        _ => "other",
    }
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub frames_processed: u64,
    pub tracks_seen: u64,
    pub stopline_crossings: u64,
    pub red_light_violations: u64,
    pub lane_violations: u64,
    pub tracks_evicted: u64,
    passed_by_class: HashMap<&'static str, u64>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&mut self, label: &str) {
        *self.passed_by_class.entry(coarse_class(label)).or_insert(0) += 1;
        self.stopline_crossings += 1;
    }

    pub fn passed_by_class(&self) -> &HashMap<&'static str, u64> {
        &self.passed_by_class
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_processed: self.frames_processed,
            tracks_seen: self.tracks_seen,
            stopline_crossings: self.stopline_crossings,
            red_light_violations: self.red_light_violations,
            lane_violations: self.lane_violations,
            tracks_evicted: self.tracks_evicted,
            passed_by_class: self
                .passed_by_class
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub frames_processed: u64,
    pub tracks_seen: u64,
    pub stopline_crossings: u64,
    pub red_light_violations: u64,
    pub lane_violations: u64,
    pub tracks_evicted: u64,
    pub passed_by_class: HashMap<String, u64>,
}
