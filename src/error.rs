//! Unified error types for beatcut
//!
//! Error strategy:
//! - Per-clip errors (sidecar metadata): recoverable, skip clip and continue
//! - Configuration errors and audio/output errors: fatal, abort the run
//! - Cancellation: a distinct outcome, neither a config nor a computation
//!   error; partial results are discarded

use std::path::PathBuf;
use thiserror::Error;

/// Supported video container extensions for helpful error messages
pub const SUPPORTED_VIDEO_FORMATS: &str = "MP4, MOV, MKV, AVI, WEBM";

/// Top-level error type for beatcut operations
#[derive(Debug, Error)]
pub enum BeatcutError {
    // =========================================================================
    // Fatal errors - abort the run
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to decode audio file '{path}': {reason}\n  Tip: If the file plays in other apps, it may be corrupted or use an unsupported codec")]
    Decode { path: PathBuf, reason: String },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    Output { path: PathBuf, reason: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Recoverable errors - skip clip, continue run
    // =========================================================================
    #[error("Failed to load clip metadata for '{path}': {reason}\n  Tip: Each clip needs a '<file>.json' sidecar with at least duration_seconds")]
    ClipMetadata { path: PathBuf, reason: String },

    #[error("Unsupported video format for '{path}': {format}\n  Supported formats: {SUPPORTED_VIDEO_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    // =========================================================================
    // Cancellation - cooperative abort, not an error in the computation
    // =========================================================================
    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for beatcut operations
pub type Result<T> = std::result::Result<T, BeatcutError>;

impl BeatcutError {
    /// Returns true if this error is recoverable (skip the clip, continue the run)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BeatcutError::ClipMetadata { .. } | BeatcutError::UnsupportedFormat { .. }
        )
    }

    /// Returns true if this is the cooperative cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BeatcutError::Cancelled)
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BeatcutError::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a clip-metadata error with context about the issue
    pub fn clip_metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BeatcutError::ClipMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error for the given destination path
    pub fn output_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BeatcutError::Output {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_errors_are_recoverable() {
        let err = BeatcutError::clip_metadata("/clips/a.mp4", "missing sidecar");
        assert!(err.is_recoverable());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancellation_is_distinct() {
        let err = BeatcutError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_recoverable());

        let config = BeatcutError::Config("minBpm >= maxBpm".into());
        assert!(!config.is_cancelled());
        assert!(!config.is_recoverable());
    }
}
