//! Edit-plan JSON export
//!
//! The plan is the hand-off to the external renderer: every event names its
//! source clip by id and resolved path, with in-point, duration and timeline
//! position in seconds. The renderer trims each segment and concatenates
//! them, optionally muxing in the original audio track.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BeatcutError, Result};
use crate::types::{AudioAnalysis, ClipId, TimelineEvent, VideoClip};

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level edit-plan document
#[derive(Debug, Serialize, Deserialize)]
pub struct EditPlanJson {
    /// Schema version for forward compatibility
    pub version: String,
    /// Generator metadata
    pub metadata: ExportMetadata,
    /// Summary of the audio analysis the plan was cut against
    pub audio: AudioJson,
    /// Clips referenced by the events
    pub clips: Vec<ClipJson>,
    /// Ordered, gapless event list
    pub events: Vec<EventJson>,
}

/// Export metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// beatcut version that generated this file
    pub generator_version: String,
    /// Timestamp of export (RFC 3339)
    pub generated_at: String,
    /// RNG seed the timeline was built with
    pub seed: u64,
    /// Number of events in the plan
    pub event_count: usize,
}

/// Audio summary carried along for the renderer
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioJson {
    pub source_path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub hop_size: usize,
    pub bpm: f64,
    pub beat_period_seconds: f64,
    pub beat_times: Vec<f64>,
}

/// One referenced source clip
#[derive(Debug, Serialize, Deserialize)]
pub struct ClipJson {
    pub id: i32,
    pub path: String,
    pub duration_seconds: f64,
}

/// One trimmed segment of the output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventJson {
    pub clip_id: i32,
    pub source_path: String,
    pub source_start: f64,
    pub duration: f64,
    pub timeline_start: f64,
}

/// Assemble the plan document from analysis, pool and events.
pub fn build_plan(
    audio: &AudioAnalysis,
    clips: &[VideoClip],
    events: &[TimelineEvent],
    seed: u64,
) -> EditPlanJson {
    let by_id: HashMap<ClipId, &VideoClip> = clips.iter().map(|c| (c.id, c)).collect();

    let event_rows = events
        .iter()
        .map(|event| EventJson {
            clip_id: event.clip_id.0,
            source_path: by_id
                .get(&event.clip_id)
                .map(|c| c.path.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_start: event.source_start,
            duration: event.duration,
            timeline_start: event.timeline_start,
        })
        .collect();

    EditPlanJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            seed,
            event_count: events.len(),
        },
        audio: AudioJson {
            source_path: audio.source_path.to_string_lossy().into_owned(),
            duration_seconds: audio.duration_seconds,
            sample_rate: audio.sample_rate,
            hop_size: audio.hop_size,
            bpm: audio.bpm,
            beat_period_seconds: audio.beat_period_seconds,
            beat_times: audio.beat_times.clone(),
        },
        clips: clips
            .iter()
            .map(|clip| ClipJson {
                id: clip.id.0,
                path: clip.path.to_string_lossy().into_owned(),
                duration_seconds: clip.duration_seconds,
            })
            .collect(),
        events: event_rows,
    }
}

/// Write the plan as pretty-printed JSON.
pub fn write_edit_plan(plan: &EditPlanJson, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| BeatcutError::output_error(path, e.to_string()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, plan)
        .map_err(|e| BeatcutError::output_error(path, e.to_string()))?;

    info!("Wrote edit plan: {} ({} events)", path.display(), plan.events.len());
    Ok(())
}
