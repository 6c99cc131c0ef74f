//! Runtime configuration settings
//!
//! Parameter combinations are validated up front: invalid configuration is
//! rejected before any processing begins, never silently corrected.

use std::path::PathBuf;

use crate::error::{BeatcutError, Result};

/// Default snap window for beat peak snapping (seconds)
const DEFAULT_SNAP_WINDOW_SECONDS: f64 = 0.12;

/// Parameters for the audio analysis stages
#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    /// Analysis window length in samples
    pub window_size: usize,
    /// Frame advance in samples (must be smaller than the window)
    pub hop_size: usize,
    /// Lower bound of the tempo search range (BPM)
    pub min_bpm: f64,
    /// Upper bound of the tempo search range (BPM)
    pub max_bpm: f64,
    /// Half-width of the beat snap window (seconds)
    pub snap_window_seconds: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            min_bpm: 70.0,
            max_bpm: 190.0,
            snap_window_seconds: DEFAULT_SNAP_WINDOW_SECONDS,
        }
    }
}

impl AnalysisParams {
    /// Fail fast on invalid parameter combinations
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(BeatcutError::Config("window size must be positive".into()));
        }
        if self.hop_size == 0 {
            return Err(BeatcutError::Config("hop size must be positive".into()));
        }
        if self.hop_size >= self.window_size {
            return Err(BeatcutError::Config(format!(
                "hop size ({}) must be smaller than window size ({})",
                self.hop_size, self.window_size
            )));
        }
        if self.min_bpm <= 0.0 || self.max_bpm <= 0.0 {
            return Err(BeatcutError::Config("BPM bounds must be positive".into()));
        }
        if self.min_bpm >= self.max_bpm {
            return Err(BeatcutError::Config(format!(
                "min BPM ({}) must be below max BPM ({})",
                self.min_bpm, self.max_bpm
            )));
        }
        if self.snap_window_seconds <= 0.0 {
            return Err(BeatcutError::Config("snap window must be positive".into()));
        }
        Ok(())
    }
}

/// Parameters for timeline construction
#[derive(Debug, Clone, Copy)]
pub struct BuildParams {
    /// Shortest allowed segment (seconds)
    pub min_clip_seconds: f64,
    /// Longest allowed segment (seconds)
    pub max_clip_seconds: f64,
    /// 0-100 control mapped to the probability of cutting on an eligible beat
    pub aggressiveness: f64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            min_clip_seconds: 0.6,
            max_clip_seconds: 3.5,
            aggressiveness: 60.0,
        }
    }
}

impl BuildParams {
    /// Fail fast on invalid parameter combinations
    pub fn validate(&self) -> Result<()> {
        if self.min_clip_seconds <= 0.0 || self.max_clip_seconds <= 0.0 {
            return Err(BeatcutError::Config(
                "clip durations must be positive".into(),
            ));
        }
        if self.min_clip_seconds > self.max_clip_seconds {
            return Err(BeatcutError::Config(format!(
                "min clip duration ({}s) must not exceed max clip duration ({}s)",
                self.min_clip_seconds, self.max_clip_seconds
            )));
        }
        Ok(())
    }

    /// Probability of cutting on an eligible beat, linear in aggressiveness:
    /// 0 -> 0.3, 100 -> 1.0.
    pub fn cut_probability(&self) -> f64 {
        0.3 + 0.7 * (self.aggressiveness / 100.0).clamp(0.0, 1.0)
    }
}

/// Runtime settings for one pipeline run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Audio track to analyze
    pub audio: PathBuf,
    /// Directory with video clips and their sidecars
    pub clips: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Audio analysis parameters
    pub analysis: AnalysisParams,
    /// Timeline construction parameters
    pub build: BuildParams,
    /// RNG seed; None draws one from entropy
    pub seed: Option<u64>,
    /// Number of worker threads
    pub threads: usize,
    /// Scan clips recursively
    pub recursive: bool,
    /// Show progress output
    pub show_progress: bool,
    /// List discovered clips without processing
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let total_cores = num_cpus::get();
        // One core stays free for the clip-pool worker and the OS
        let default_threads = total_cores.saturating_sub(1).max(1);

        Self {
            audio: cli.audio.clone(),
            clips: cli.clips.clone(),
            output: cli.output.clone(),
            analysis: AnalysisParams {
                window_size: cli.window_size,
                hop_size: cli.hop_size,
                min_bpm: cli.min_bpm,
                max_bpm: cli.max_bpm,
                snap_window_seconds: DEFAULT_SNAP_WINDOW_SECONDS,
            },
            build: BuildParams {
                min_clip_seconds: cli.min_clip,
                max_clip_seconds: cli.max_clip,
                aggressiveness: cli.aggressiveness,
            },
            seed: cli.seed,
            threads: cli.threads.unwrap_or(default_threads),
            recursive: cli.recursive,
            show_progress: !cli.quiet,
            dry_run: cli.dry_run,
        }
    }

    /// Validate every parameter group before processing starts
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.build.validate()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: PathBuf::new(),
            clips: PathBuf::from("."),
            output: PathBuf::from("./output"),
            analysis: AnalysisParams::default(),
            build: BuildParams::default(),
            seed: None,
            threads: num_cpus::get().saturating_sub(1).max(1),
            recursive: true,
            show_progress: true,
            dry_run: false,
        }
    }
}
