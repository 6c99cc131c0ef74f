//! Video clip pool assembly
//!
//! Clips arrive as files on disk plus sidecar metadata produced by external
//! collaborators (scene detection writes `<file>.json`, players write
//! `<file>.pbf`). This module turns discovered clips into [`VideoClip`]
//! records; a clip whose metadata cannot be loaded is skipped, not fatal.

pub mod bookmarks;
pub mod manifest;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::discovery::DiscoveredClip;
use crate::error::Result;
use crate::types::VideoClip;

/// Load the metadata for one discovered clip.
pub fn load_clip(discovered: &DiscoveredClip) -> Result<VideoClip> {
    let manifest = manifest::load(&discovered.path)?;

    let mut scene_changes = manifest.scene_changes;
    scene_changes.retain(|t| t.is_finite() && *t >= 0.0);
    scene_changes.sort_by(|a, b| a.total_cmp(b));

    let mut bookmarks = manifest.bookmarks;
    bookmarks.retain(|t| t.is_finite() && *t >= 0.0);
    bookmarks.extend(bookmarks::bookmarks_for(&discovered.path));
    bookmarks.sort_by(|a, b| a.total_cmp(b));

    debug!(
        "Loaded clip {}: {:.1}s, {} scene changes, {} bookmarks",
        discovered.path.display(),
        manifest.duration_seconds,
        scene_changes.len(),
        bookmarks.len()
    );

    Ok(VideoClip {
        id: discovered.id,
        path: discovered.path.clone(),
        duration_seconds: manifest.duration_seconds,
        frame_rate: manifest.frame_rate,
        scene_changes,
        bookmarks,
    })
}

/// Load every discovered clip in parallel, skipping the unreadable ones.
/// Pool order follows the (sorted) discovery order, so seeded builds are
/// reproducible.
pub fn load_pool(discovered: &[DiscoveredClip]) -> Vec<VideoClip> {
    discovered
        .par_iter()
        .filter_map(|clip| match load_clip(clip) {
            Ok(clip) => Some(clip),
            Err(e) => {
                warn!("Skipping {}: {}", clip.path.display(), e);
                None
            }
        })
        .collect()
}
