//! Audio decoding adapters
//!
//! The analysis core consumes plain mono f32 samples; this module supplies
//! them from real audio files via symphonia, one packet at a time.

pub mod decoder;

pub use decoder::{open, SampleStream};
