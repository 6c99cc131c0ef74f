//! Clip discovery and scanning

pub mod scanner;

pub use scanner::{generate_clip_id, scan, DiscoveredClip, VideoFormat};
