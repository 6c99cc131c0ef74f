//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// beatcut - beat-synchronized rough cuts from music and raw footage
///
/// Analyzes an audio track for onsets, tempo and beats, then walks the beat
/// grid over a pool of video clips to emit a gapless, beat-aligned edit plan
/// that an external renderer can turn into a finished video.
#[derive(Parser, Debug)]
#[command(name = "beatcut")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Audio track to cut against
    #[arg(short, long, value_name = "FILE")]
    pub audio: PathBuf,

    /// Directory containing video clips (with '<file>.json' metadata sidecars)
    #[arg(short, long, value_name = "DIR")]
    pub clips: PathBuf,

    /// Output directory for the edit plan
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Minimum clip duration in seconds
    #[arg(long, default_value = "0.6", value_name = "SECS")]
    pub min_clip: f64,

    /// Maximum clip duration in seconds
    #[arg(long, default_value = "3.5", value_name = "SECS")]
    pub max_clip: f64,

    /// Cutting aggressiveness 0-100 (higher = cut on more beats = shorter clips)
    #[arg(long, default_value = "60", value_name = "LEVEL")]
    pub aggressiveness: f64,

    /// RNG seed for reproducible timelines (random when omitted)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Analysis window size in samples
    #[arg(long, default_value = "1024", value_name = "SAMPLES")]
    pub window_size: usize,

    /// Analysis hop size in samples
    #[arg(long, default_value = "512", value_name = "SAMPLES")]
    pub hop_size: usize,

    /// Lower bound of the tempo search range
    #[arg(long, default_value = "70", value_name = "BPM")]
    pub min_bpm: f64,

    /// Upper bound of the tempo search range
    #[arg(long, default_value = "190", value_name = "BPM")]
    pub max_bpm: f64,

    /// Number of worker threads (defaults to CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Scan the clips directory recursively
    #[arg(short, long, default_value = "true")]
    pub recursive: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - list discovered clips without analyzing or building
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
