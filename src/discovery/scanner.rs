//! Video file discovery and scanning

use hash32::FnvHasher;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BeatcutError, Result};
use crate::types::ClipId;

/// Video container formats beatcut will pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mp4,
    Mov,
    Mkv,
    Avi,
    Webm,
}

impl VideoFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp4" | "m4v" => Some(VideoFormat::Mp4),
            "mov" => Some(VideoFormat::Mov),
            "mkv" => Some(VideoFormat::Mkv),
            "avi" => Some(VideoFormat::Avi),
            "webm" => Some(VideoFormat::Webm),
            _ => None,
        }
    }

    /// Check if a path has a supported extension
    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .is_some()
    }
}

/// Discovered video clip with basic file metadata
#[derive(Debug, Clone)]
pub struct DiscoveredClip {
    pub id: ClipId,
    pub path: PathBuf,
    pub format: VideoFormat,
    pub size_bytes: u64,
}

/// Scan a path (file or directory) for video clips.
///
/// Results are sorted by path so the pool order, and therefore any seeded
/// build over it, does not depend on directory iteration order.
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DiscoveredClip>> {
    if !input.exists() {
        return Err(BeatcutError::FileNotFound(input.to_path_buf()));
    }

    let mut clips = Vec::new();

    if input.is_file() {
        // Single clip mode
        if let Some(clip) = try_discover_clip(input) {
            clips.push(clip);
        } else {
            return Err(BeatcutError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                if let Some(clip) = try_discover_clip(path) {
                    debug!("Discovered: {}", clip.path.display());
                    clips.push(clip);
                }
            }
        }
    }

    clips.sort_by(|a, b| a.path.cmp(&b.path));

    info!("Discovered {} video clips", clips.len());

    if clips.is_empty() {
        warn!("No supported video clips found in {}", input.display());
    }

    Ok(clips)
}

/// Try to create a DiscoveredClip if the path is a supported video format
fn try_discover_clip(path: &Path) -> Option<DiscoveredClip> {
    let ext = path.extension()?.to_str()?;
    let format = VideoFormat::from_extension(ext)?;

    let metadata = std::fs::metadata(path).ok()?;
    let size_bytes = metadata.len();

    Some(DiscoveredClip {
        id: generate_clip_id(path),
        path: path.to_path_buf(),
        format,
        size_bytes,
    })
}

/// Generate a deterministic clip ID from a file path
///
/// Uses FNV-1a hash, masked to the positive i32 range
pub fn generate_clip_id(path: &Path) -> ClipId {
    use hash32::Hasher as Hash32Hasher;

    // Normalize path for cross-platform consistency
    let normalized = normalize_path_for_hash(path);

    let mut hasher = FnvHasher::default();
    hasher.write(normalized.as_bytes());
    let hash = hasher.finish();

    // Mask off sign bit to ensure positive value
    ClipId((hash & 0x7FFF_FFFF) as i32)
}

/// Normalize a path string for consistent hashing across platforms
fn normalize_path_for_hash(path: &Path) -> String {
    let path_str = path.to_string_lossy();

    // Convert backslashes to forward slashes
    let normalized = path_str.replace('\\', "/");

    // Lowercase for case-insensitive filesystems
    normalized.to_lowercase()
}
