//! beatcut - Beat-Synchronized Rough-Cut Generator
//!
//! Turns an audio track and a pool of video clips into a beat-aligned,
//! gapless edit plan: cut points land on musical beats, segment lengths stay
//! inside configured bounds, and source selection seeks variety.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `audio`: streaming audio decoding using symphonia
//! - `analysis`: onset envelope, tempo estimation and beat tracking
//! - `discovery`: clip scanning and stable clip ID generation
//! - `video`: clip metadata sidecars (scene changes, PotPlayer bookmarks)
//! - `timeline`: the generative cut-list builder
//! - `pipeline`: orchestration of one end-to-end run
//! - `export`: edit-plan JSON output for the external renderer
//!
//! The analysis and timeline modules are pure: no file I/O, explicit
//! cancellation, injected seedable randomness. Identical inputs plus an
//! identical seed reproduce an identical timeline.
//!
//! # Example
//!
//! ```no_run
//! use beatcut::{config::Settings, pipeline, CancelToken};
//!
//! let settings = Settings {
//!     audio: "track.mp3".into(),
//!     clips: "./footage".into(),
//!     output: "./out".into(),
//!     seed: Some(42),
//!     ..Settings::default()
//! };
//! let result = pipeline::run(&settings, &CancelToken::new()).expect("pipeline failed");
//! println!("{} events at {:.1} BPM", result.event_count, result.bpm);
//! ```

pub mod analysis;
pub mod audio;
pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod timeline;
pub mod types;
pub mod video;

// Re-export key types at crate root
pub use cancel::CancelToken;
pub use error::{BeatcutError, Result};
pub use types::{AudioAnalysis, ClipId, TempoEstimate, TimelineEvent, VideoClip};
