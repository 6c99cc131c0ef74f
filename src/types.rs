//! Core data types for beatcut
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Audio analysis results
// =============================================================================

/// Tempo estimate derived from the onset envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Beats per minute, folded into the configured search range
    pub bpm: f64,
    /// Seconds between beats (`60 / bpm`)
    pub beat_period_seconds: f64,
}

impl TempoEstimate {
    pub fn from_bpm(bpm: f64) -> Self {
        Self {
            bpm,
            beat_period_seconds: 60.0 / bpm,
        }
    }
}

/// Complete rhythmic analysis of one audio track
///
/// The onset envelope holds one normalized value per hop; index `i`
/// corresponds to time `i * hop_size / sample_rate`. Beat times are in
/// seconds, strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Original audio file path
    pub source_path: PathBuf,
    /// Track duration in seconds, derived from the samples actually consumed
    pub duration_seconds: f64,
    /// Sample rate of the decoded stream
    pub sample_rate: u32,
    /// Samples advanced per analysis frame
    pub hop_size: usize,
    /// Estimated tempo
    pub bpm: f64,
    /// Seconds between beats (`60 / bpm`)
    pub beat_period_seconds: f64,
    /// Normalized onset-strength curve, one value per hop
    pub onset_envelope: Vec<f32>,
    /// Beat timestamps in seconds
    pub beat_times: Vec<f64>,
}

// =============================================================================
// Video clips
// =============================================================================

/// Stable clip identifier derived from the clip's path
///
/// Cursor state during timeline construction is keyed by this id, so the
/// builder never relies on reference identity of the metadata records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub i32);

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for one source video clip
///
/// Read-only to the core: duration and scene changes come from the external
/// scene-detection collaborator, bookmarks from player sidecar files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoClip {
    pub id: ClipId,
    /// Original file path
    pub path: PathBuf,
    /// Clip length in seconds
    pub duration_seconds: f64,
    /// Frames per second
    pub frame_rate: f64,
    /// Timestamps (seconds) where scene changes were detected, ascending
    pub scene_changes: Vec<f64>,
    /// Bookmarks (seconds) from player sidecars, ascending
    pub bookmarks: Vec<f64>,
}

// =============================================================================
// Timeline
// =============================================================================

/// One segment of the generated edit
///
/// Invariants for a successful build: `source_start >= 0`,
/// `source_start + duration <= clip.duration_seconds`, `duration > 0`, and
/// consecutive events are contiguous
/// (`next.timeline_start == timeline_start + duration`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Which source clip the segment comes from
    pub clip_id: ClipId,
    /// In-point within the source clip (seconds)
    pub source_start: f64,
    /// Segment length (seconds)
    pub duration: f64,
    /// Position of the segment in the output timeline (seconds)
    pub timeline_start: f64,
}
