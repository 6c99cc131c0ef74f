//! Timeline construction
//!
//! Walks the beat grid and a pool of video clips to emit a gapless,
//! duration-bounded cut list. Cut points prefer beats; the aggressiveness
//! control maps linearly to the probability of cutting on any eligible beat
//! (0 -> 0.3, 100 -> 1.0), so high aggressiveness yields short, busy cuts
//! and low aggressiveness skips beats for longer clips.
//!
//! All randomness (cut decisions, clip choice, in-point jumps) comes from
//! the injected generator: identical inputs plus an identical seed
//! reproduce an identical timeline.

use std::collections::HashMap;

use rand::Rng;

use crate::cancel::CancelToken;
use crate::config::BuildParams;
use crate::error::Result;
use crate::types::{ClipId, TimelineEvent, VideoClip};

/// Segments at or below this length trigger the forward-progress safety valve
const NEGLIGIBLE_DURATION: f64 = 0.001;

/// Increment applied by the safety valve to guarantee loop termination
const SAFETY_INCREMENT: f64 = 0.1;

/// Scene boundaries earlier than this are ignored when re-seeking a clip
const SCENE_SKIP_HEAD_SECONDS: f64 = 5.0;

/// Build a beat-aligned edit list covering `track_duration_seconds`.
///
/// Consecutive events are contiguous and the total duration matches the
/// track duration. An empty clip pool yields an empty list, a valid
/// degenerate output rather than an error.
pub fn build<R: Rng>(
    beat_grid: &[f64],
    track_duration_seconds: f64,
    clips: &[VideoClip],
    params: &BuildParams,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<Vec<TimelineEvent>> {
    params.validate()?;

    let mut timeline: Vec<TimelineEvent> = Vec::new();
    if clips.is_empty() {
        return Ok(timeline);
    }

    // A terminal beat at the end of the track guarantees full coverage even
    // when the natural grid falls short.
    let mut beats = beat_grid.to_vec();
    if beats.last().map_or(true, |&last| last < track_duration_seconds) {
        beats.push(track_duration_seconds);
    }

    let min_clip = params.min_clip_seconds;
    let max_clip = params.max_clip_seconds;
    let cut_probability = params.cut_probability();

    // Cursor state is keyed by clip id, never by reference identity, and
    // lives only for the duration of this call.
    let mut cursors: HashMap<ClipId, f64> = HashMap::new();
    let mut current = 0.0f64;
    let mut beat_index = 0usize;

    while current < track_duration_seconds {
        cancel.check()?;

        // 1. Pick the cut point: scan for the first beat at least min_clip
        //    away, then decide whether to cut there or stretch further.
        let mut next_cut = None;
        for i in beat_index..beats.len() {
            let t = beats[i];
            let duration = t - current;
            if duration < min_clip {
                continue;
            }

            if duration <= max_clip {
                let cut_here = rng.gen::<f64>() < cut_probability;
                // the 0.8 threshold forces a cut before the max bound is
                // exceeded even under low aggressiveness
                if cut_here || duration >= max_clip * 0.8 {
                    next_cut = Some(t);
                    beat_index = i + 1;
                    break;
                }
                // otherwise keep scanning later beats for a longer clip
            } else {
                // No beat fits the window: cut at the max length and skip
                // every beat the synthetic cut passes over. Tunable policy;
                // snapping to the nearest beat instead would also be viable.
                let cut = current + max_clip;
                while beat_index < beats.len() && beats[beat_index] < cut {
                    beat_index += 1;
                }
                next_cut = Some(cut);
                break;
            }
        }

        // 2. Grid exhausted without a decision: close out the track.
        let cut_time = next_cut.unwrap_or_else(|| {
            let remaining = track_duration_seconds - current;
            current + remaining.min(max_clip)
        });

        let segment = cut_time - current;

        // 3. Choose a source clip, avoiding the one just used.
        let clip = select_clip(clips, timeline.last().map(|e| e.clip_id), rng);

        // 4. Place the segment within the clip via its cursor.
        let cursor = cursors.get(&clip.id).copied().unwrap_or(0.0);
        let (source_start, duration) = place_segment(clip, cursor, segment, rng);

        cursors.insert(clip.id, source_start + duration);
        timeline.push(TimelineEvent {
            clip_id: clip.id,
            source_start,
            duration,
            timeline_start: current,
        });

        current += duration;

        // safety valve: guarantee forward progress on degenerate durations
        if duration <= NEGLIGIBLE_DURATION {
            current += SAFETY_INCREMENT;
        }
    }

    Ok(timeline)
}

/// Uniformly pick a clip, excluding the immediately preceding one when the
/// pool allows it.
fn select_clip<'a, R: Rng>(
    clips: &'a [VideoClip],
    last: Option<ClipId>,
    rng: &mut R,
) -> &'a VideoClip {
    if clips.len() == 1 {
        return &clips[0];
    }

    let candidates: Vec<&VideoClip> = match last {
        Some(last_id) => clips.iter().filter(|c| c.id != last_id).collect(),
        None => clips.iter().collect(),
    };

    // cannot be empty with more than one clip, but fall back to the full pool
    if candidates.is_empty() {
        &clips[rng.gen_range(0..clips.len())]
    } else {
        candidates[rng.gen_range(0..candidates.len())]
    }
}

/// Resolve the in-point for a segment of length `duration` within `clip`,
/// starting from the clip's cursor.
///
/// When the cursor would run past the end of the clip it wraps to the head,
/// preferring the first scene boundary that is past the opening seconds and
/// leaves enough room. Otherwise the cursor occasionally jumps 2-10 seconds
/// forward for footage variety.
fn place_segment<R: Rng>(
    clip: &VideoClip,
    cursor: f64,
    duration: f64,
    rng: &mut R,
) -> (f64, f64) {
    let mut start = cursor;

    if start + duration > clip.duration_seconds {
        start = 0.0;
        if let Some(scene) = clip
            .scene_changes
            .iter()
            .copied()
            .find(|&t| t > SCENE_SKIP_HEAD_SECONDS && t < clip.duration_seconds - duration)
        {
            start = scene;
        }
    } else if rng.gen::<f64>() > 0.7 {
        start += 2.0 + rng.gen::<f64>() * 8.0;
        if start + duration > clip.duration_seconds {
            start = 0.0;
        }
    }

    // A clip shorter than the segment hosts a truncated segment rather than
    // an out-of-range in-point; pools of adequately long clips never get here.
    if start + duration > clip.duration_seconds {
        return (0.0, duration.min(clip.duration_seconds));
    }

    (start, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::path::PathBuf;

    fn token() -> CancelToken {
        CancelToken::new()
    }

    fn clip(id: i32, duration: f64) -> VideoClip {
        VideoClip {
            id: ClipId(id),
            path: PathBuf::from(format!("clip_{id}.mp4")),
            duration_seconds: duration,
            frame_rate: 30.0,
            scene_changes: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    fn params(min: f64, max: f64, aggressiveness: f64) -> BuildParams {
        BuildParams {
            min_clip_seconds: min,
            max_clip_seconds: max,
            aggressiveness,
        }
    }

    fn assert_contiguous(events: &[TimelineEvent], total: f64) {
        for pair in events.windows(2) {
            assert_eq!(
                pair[1].timeline_start,
                pair[0].timeline_start + pair[0].duration,
                "timeline has a gap"
            );
        }
        let sum: f64 = events.iter().map(|e| e.duration).sum();
        assert!((sum - total).abs() < 1e-3, "covered {} of {}", sum, total);
    }

    #[test]
    fn empty_pool_yields_empty_timeline() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let events = build(
            &[1.0, 2.0],
            5.0,
            &[],
            &params(1.0, 2.0, 50.0),
            &mut rng,
            &token(),
        )
        .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn single_clip_covers_the_track_exactly() {
        // beat grid at whole seconds, clip lengths bounded to [1, 2]
        let grid = [1.0, 2.0, 3.0, 4.0, 5.0];
        let pool = [clip(1, 10.0)];

        for seed in 0..8 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let events = build(&grid, 5.0, &pool, &params(1.0, 2.0, 60.0), &mut rng, &token())
                .unwrap();

            assert!(!events.is_empty());
            for event in &events {
                assert!(
                    (1.0..=2.0).contains(&event.duration),
                    "duration {} out of bounds",
                    event.duration
                );
                assert!(event.source_start >= 0.0);
                assert!(event.source_start + event.duration <= 10.0 + 1e-9);
            }
            assert_contiguous(&events, 5.0);
            let sum: f64 = events.iter().map(|e| e.duration).sum();
            assert_eq!(sum, 5.0, "beat-aligned cuts must sum exactly");
        }
    }

    #[test]
    fn full_aggressiveness_cuts_on_the_earliest_eligible_beat() {
        // grid every 0.5s; with cut probability 1.0 every segment must end
        // on the first beat at least min_clip away
        let grid: Vec<f64> = (1..=20).map(|i| i as f64 * 0.5).collect();
        let pool = [clip(1, 120.0), clip(2, 120.0)];

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let events = build(
            &grid,
            10.0,
            &pool,
            &params(0.4, 2.0, 100.0),
            &mut rng,
            &token(),
        )
        .unwrap();

        for event in &events {
            assert!(
                (event.duration - 0.5).abs() < 1e-9,
                "expected earliest-beat cuts, got {}",
                event.duration
            );
        }
        assert_contiguous(&events, 10.0);
    }

    #[test]
    fn identical_seeds_reproduce_identical_timelines() {
        let grid: Vec<f64> = (1..=40).map(|i| i as f64 * 0.45).collect();
        let pool = [clip(1, 60.0), clip(2, 45.0), clip(3, 90.0)];
        let p = params(0.6, 3.5, 60.0);

        let mut rng_a = ChaCha8Rng::seed_from_u64(1234);
        let mut rng_b = ChaCha8Rng::seed_from_u64(1234);
        let a = build(&grid, 18.0, &pool, &p, &mut rng_a, &token()).unwrap();
        let b = build(&grid, 18.0, &pool, &p, &mut rng_b, &token()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_events_use_different_clips() {
        let grid: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let pool = [clip(1, 300.0), clip(2, 300.0), clip(3, 300.0)];

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let events = build(
            &grid,
            30.0,
            &pool,
            &params(1.0, 3.0, 80.0),
            &mut rng,
            &token(),
        )
        .unwrap();

        for pair in events.windows(2) {
            assert_ne!(pair[0].clip_id, pair[1].clip_id);
        }
    }

    #[test]
    fn empty_grid_falls_back_to_max_length_cuts() {
        let pool = [clip(1, 60.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let events = build(&[], 7.0, &pool, &params(0.6, 3.5, 60.0), &mut rng, &token()).unwrap();

        // synthesized terminal beat at 7.0; first cut forced at 3.5
        assert_eq!(events.len(), 2);
        assert!((events[0].duration - 3.5).abs() < 1e-9);
        assert!((events[1].duration - 3.5).abs() < 1e-9);
        assert_contiguous(&events, 7.0);
    }

    #[test]
    fn source_ranges_stay_inside_their_clips() {
        let grid: Vec<f64> = (1..=56).map(|i| i as f64 * 0.7).collect();
        let mut short = clip(2, 12.0);
        short.scene_changes = vec![2.0, 6.0, 9.5];
        let pool = [clip(1, 25.0), short];

        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let events = build(
                &grid,
                40.0,
                &pool,
                &params(0.6, 3.5, 40.0),
                &mut rng,
                &token(),
            )
            .unwrap();

            for event in &events {
                let clip = pool.iter().find(|c| c.id == event.clip_id).unwrap();
                assert!(event.source_start >= 0.0);
                assert!(
                    event.source_start + event.duration <= clip.duration_seconds + 1e-9,
                    "event {:?} overruns clip of {}s",
                    event,
                    clip.duration_seconds
                );
            }
            assert_contiguous(&events, 40.0);
        }
    }

    #[test]
    fn scene_boundary_is_preferred_when_wrapping() {
        // cursor forced past the end on the second event; scene change at
        // 6.0 is past the head-skip threshold and leaves room
        let mut c = clip(1, 14.0);
        c.scene_changes = vec![1.0, 6.0, 13.8];
        let pool = [c];

        // grid forcing ~3.5s segments from a single clip
        let grid = [3.5, 7.0, 10.5, 14.0];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let events = build(
            &grid,
            14.0,
            &pool,
            &params(3.0, 3.5, 100.0),
            &mut rng,
            &token(),
        )
        .unwrap();

        // four 3.5s segments over a 14s clip: at least one wrap occurs, and
        // wrapped in-points land on 0.0 or the 6.0 scene boundary
        assert_eq!(events.len(), 4);
        for event in &events {
            assert!(event.source_start + event.duration <= 14.0 + 1e-9);
        }
        assert_contiguous(&events, 14.0);
    }

    #[test]
    fn rejects_inverted_duration_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool = [clip(1, 10.0)];
        let err = build(
            &[1.0],
            5.0,
            &pool,
            &params(3.0, 1.0, 50.0),
            &mut rng,
            &token(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::BeatcutError::Config(_)));
    }

    #[test]
    fn cancellation_aborts_the_build() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool = [clip(1, 10.0)];
        let err = build(
            &[1.0, 2.0],
            5.0,
            &pool,
            &params(1.0, 2.0, 50.0),
            &mut rng,
            &cancel,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
    }
}
