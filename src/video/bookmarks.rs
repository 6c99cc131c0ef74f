//! PotPlayer bookmark sidecars (.pbf)
//!
//! PotPlayer stores bookmarks in an INI-like format, one per line:
//!
//! ```text
//! 0=00:01:23.456*Bookmark Name
//! 1=123.456*Another Bookmark
//! 2=65568*Example*<snapshot data>
//! ```
//!
//! The all-digit form is milliseconds. Bookmarks are a hint for the editor;
//! a malformed file is logged and ignored, never a reason to drop a clip.

use std::path::{Path, PathBuf};

use tracing::warn;

/// The bookmark file shares the clip's full name with `.pbf` appended.
pub fn bookmark_path(video_path: &Path) -> PathBuf {
    let mut os = video_path.as_os_str().to_os_string();
    os.push(".pbf");
    PathBuf::from(os)
}

/// Bookmarks for a clip, from its `.pbf` sidecar if one exists.
pub fn bookmarks_for(video_path: &Path) -> Vec<f64> {
    let path = bookmark_path(video_path);
    if !path.exists() {
        return Vec::new();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_bookmarks(&content),
        Err(e) => {
            warn!("Failed to read bookmarks '{}': {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Parse bookmark timestamps out of `.pbf` content, sorted ascending.
/// Lines that do not match the `N=<time>*...` shape are ignored.
pub fn parse_bookmarks(content: &str) -> Vec<f64> {
    let mut timestamps = Vec::new();

    for line in content.lines() {
        let Some((index, rest)) = line.split_once('=') else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Some((time, _)) = rest.split_once('*') else {
            continue;
        };
        if let Some(seconds) = parse_time(time.trim()) {
            timestamps.push(seconds);
        }
    }

    timestamps.sort_by(|a, b| a.total_cmp(b));
    timestamps
}

/// Accepts integer milliseconds, decimal seconds, or `HH:MM:SS[.mmm]`.
fn parse_time(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }

    // all-digit form is milliseconds
    if value.chars().all(|c| c.is_ascii_digit()) {
        return value.parse::<i64>().ok().map(|ms| ms as f64 / 1000.0);
    }

    // plain decimal seconds
    if let Ok(seconds) = value.parse::<f64>() {
        return (seconds.is_finite() && seconds >= 0.0).then_some(seconds);
    }

    // HH:MM:SS or HH:MM:SS.mmm
    let mut parts = value.split(':');
    let hours = parts.next()?.parse::<u32>().ok()?;
    let minutes = parts.next()?.parse::<u32>().ok()?;
    let seconds = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_millisecond_entries() {
        let bookmarks = parse_bookmarks("0=65568*Example*<snapshot>\n");
        assert_eq!(bookmarks, vec![65.568]);
    }

    #[test]
    fn parses_decimal_second_entries() {
        let bookmarks = parse_bookmarks("1=123.456*Another Bookmark\n");
        assert_eq!(bookmarks, vec![123.456]);
    }

    #[test]
    fn parses_clock_format_entries() {
        let bookmarks = parse_bookmarks("0=00:01:23.456*Named\n1=01:00:00*Hour\n");
        assert!((bookmarks[0] - 83.456).abs() < 1e-9);
        assert!((bookmarks[1] - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn output_is_sorted() {
        let content = "0=10000*b\n1=2500*a\n2=5000*c\n";
        let bookmarks = parse_bookmarks(content);
        assert_eq!(bookmarks, vec![2.5, 5.0, 10.0]);
    }

    #[test]
    fn ignores_junk_lines() {
        let content = "[Bookmark]\nnot a bookmark\n5=*empty time\n6=abc*bad time\n7=12:34*short\n8=1500*good\n";
        let bookmarks = parse_bookmarks(content);
        assert_eq!(bookmarks, vec![1.5]);
    }

    #[test]
    fn missing_file_yields_no_bookmarks() {
        assert!(bookmarks_for(Path::new("/nonexistent/clip.mp4")).is_empty());
    }

    #[test]
    fn bookmark_path_appends_to_the_full_name() {
        let path = bookmark_path(Path::new("/clips/beach.mp4"));
        assert_eq!(path, Path::new("/clips/beach.mp4.pbf"));
    }
}
