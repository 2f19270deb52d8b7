// src/main.rs
//
// Offline replay harness. Feeds a recorded detection stream (JSONL, one
// frame per line) and a scene configuration through the engine, logging
// each verdict and a session summary. Stands in for the live capture +
// detector pipeline, which is outside the decision core.
//
// Usage: replay <scene.json> <frames.jsonl> [engine.yaml]

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{info, warn};

use violation_detection::{Detection, EngineConfig, IntersectionEngine, LightColor, SceneConfig};

/// One line of the replay stream.
#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: u64,
    /// Seconds since stream start.
    time: f64,
    #[serde(default)]
    detections: Vec<Detection>,
    /// Sampled light colors, by light index. Sparse: the sampler runs at
    /// its own cadence, typically every 10th frame.
    #[serde(default)]
    lights: Vec<LightReading>,
}

#[derive(Debug, Deserialize)]
struct LightReading {
    index: usize,
    color: LightColor,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "violation_detection=info".to_string()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <scene.json> <frames.jsonl> [engine.yaml]", args[0]);
    }

    let scene = SceneConfig::load(&args[1])?;
    let engine_config = match args.get(3) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = IntersectionEngine::new(scene, engine_config)?;

    let file = File::open(&args[2]).with_context(|| format!("opening frames {}", args[2]))?;
    let reader = BufReader::new(file);

    let mut total_verdicts = 0u64;
    let mut total_violations = 0u64;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("parsing frame record at line {}", line_no + 1))?;

        for reading in &record.lights {
            engine.apply_light_reading(reading.index, reading.color);
        }

        let result = engine.process_frame(record.frame, record.time, &record.detections);
        for verdict in &result.verdicts {
            total_verdicts += 1;
            if verdict.is_violation {
                total_violations += 1;
            }
        }
        if !result.in_violation.is_empty() {
            warn!(
                "frame {}: {} track(s) in violation: {:?}",
                record.frame,
                result.in_violation.len(),
                result.in_violation
            );
        }
    }

    let summary = engine.metrics().summary();
    info!("========================================");
    info!("Replay finished");
    info!("  Frames processed:    {}", summary.frames_processed);
    info!("  Tracks seen:         {}", summary.tracks_seen);
    info!("  Stop-line crossings: {}", summary.stopline_crossings);
    info!("  Verdicts:            {} ({} violations)", total_verdicts, total_violations);
    info!("  Red-light:           {}", summary.red_light_violations);
    info!("  Restricted-lane:     {}", summary.lane_violations);
    for (class, count) in &summary.passed_by_class {
        info!("  Passed [{}]: {}", class, count);
    }

    Ok(())
}
