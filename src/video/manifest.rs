//! Clip metadata sidecars
//!
//! The external scene-detection collaborator writes a `<video>.json` sidecar
//! next to each clip with its duration, frame rate and scene-change
//! timestamps. Only `duration_seconds` is mandatory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BeatcutError, Result};

fn default_frame_rate() -> f64 {
    25.0
}

/// On-disk sidecar schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipManifest {
    /// Clip length in seconds (required, must be positive)
    pub duration_seconds: f64,
    /// Frames per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Timestamps (seconds) of detected scene changes
    #[serde(default)]
    pub scene_changes: Vec<f64>,
    /// Manually curated bookmarks (seconds)
    #[serde(default)]
    pub bookmarks: Vec<f64>,
}

/// The sidecar lives next to the clip with `.json` appended to the full
/// file name (`clip.mp4` -> `clip.mp4.json`).
pub fn sidecar_path(video_path: &Path) -> PathBuf {
    let mut os = video_path.as_os_str().to_os_string();
    os.push(".json");
    PathBuf::from(os)
}

/// Load and validate the metadata sidecar for a video file.
pub fn load(video_path: &Path) -> Result<ClipManifest> {
    let path = sidecar_path(video_path);

    let content = std::fs::read_to_string(&path).map_err(|e| {
        BeatcutError::clip_metadata(video_path, format!("cannot read '{}': {}", path.display(), e))
    })?;

    let manifest: ClipManifest = serde_json::from_str(&content).map_err(|e| {
        BeatcutError::clip_metadata(
            video_path,
            format!("invalid sidecar '{}': {}", path.display(), e),
        )
    })?;

    if !manifest.duration_seconds.is_finite() || manifest.duration_seconds <= 0.0 {
        return Err(BeatcutError::clip_metadata(
            video_path,
            "duration_seconds must be a positive number",
        ));
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn sidecar_path_appends_to_the_full_name() {
        let path = sidecar_path(Path::new("/clips/beach.mp4"));
        assert_eq!(path, Path::new("/clips/beach.mp4.json"));
    }

    #[test]
    fn loads_a_complete_manifest() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("a.mp4");
        fs::write(
            sidecar_path(&video),
            r#"{"duration_seconds": 42.5, "frame_rate": 30.0,
                "scene_changes": [3.1, 11.0], "bookmarks": [7.7]}"#,
        )
        .unwrap();

        let manifest = load(&video).unwrap();
        assert_eq!(manifest.duration_seconds, 42.5);
        assert_eq!(manifest.frame_rate, 30.0);
        assert_eq!(manifest.scene_changes, vec![3.1, 11.0]);
        assert_eq!(manifest.bookmarks, vec![7.7]);
    }

    #[test]
    fn optional_fields_default() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("b.mp4");
        fs::write(sidecar_path(&video), r#"{"duration_seconds": 10.0}"#).unwrap();

        let manifest = load(&video).unwrap();
        assert_eq!(manifest.frame_rate, 25.0);
        assert!(manifest.scene_changes.is_empty());
        assert!(manifest.bookmarks.is_empty());
    }

    #[test]
    fn missing_sidecar_is_recoverable() {
        let err = load(Path::new("/clips/none.mp4")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn rejects_nonpositive_duration() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("c.mp4");
        fs::write(sidecar_path(&video), r#"{"duration_seconds": 0.0}"#).unwrap();
        assert!(load(&video).is_err());
    }
}
