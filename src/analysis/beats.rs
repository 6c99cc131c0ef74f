//! Beat tracking over the onset envelope
//!
//! The grid stays locked to the constant period from the tempo estimate:
//! each predicted beat is snapped to the strongest onset within a small
//! window, but the prediction itself always advances by exactly one period
//! rather than re-estimating phase per beat.

use crate::cancel::CancelToken;
use crate::error::{BeatcutError, Result};

/// How far into the track to look for the phase-anchoring peak (seconds)
const ANCHOR_SEARCH_SECONDS: f64 = 5.0;

/// Track beats through an onset envelope.
///
/// The first beat is anchored on the strongest peak in the opening seconds
/// of the envelope, so the grid aligns with the most prominent early attack
/// instead of assuming the track starts on a beat. Candidates that would
/// land within half a period of the previously accepted beat are rejected;
/// this keeps snapping from collapsing two adjacent predictions onto the
/// same onset peak.
///
/// Returns timestamps in seconds, strictly increasing. An empty envelope
/// yields an empty grid.
pub fn track(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    track_duration_seconds: f64,
    beat_period_seconds: f64,
    snap_window_seconds: f64,
    cancel: &CancelToken,
) -> Result<Vec<f64>> {
    if sample_rate == 0 || hop_size == 0 {
        return Err(BeatcutError::Config(
            "sample rate and hop size must be positive".into(),
        ));
    }
    if beat_period_seconds <= 0.0 {
        return Err(BeatcutError::Config("beat period must be positive".into()));
    }
    if snap_window_seconds <= 0.0 {
        return Err(BeatcutError::Config("snap window must be positive".into()));
    }

    if envelope.is_empty() {
        return Ok(Vec::new());
    }

    let hop_seconds = hop_size as f64 / sample_rate as f64;

    // phase anchor: strongest peak in the opening stretch
    let search_end =
        ((ANCHOR_SEARCH_SECONDS / hop_seconds).round() as usize).min(envelope.len() - 1);
    let anchor = arg_max(envelope, 0, search_end);
    let mut t = anchor as f64 * hop_seconds;

    let snap_radius = (snap_window_seconds / hop_seconds).round() as usize;

    let mut beats: Vec<f64> =
        Vec::with_capacity((track_duration_seconds / beat_period_seconds) as usize + 8);

    while t < track_duration_seconds {
        cancel.check()?;

        let expected = (t / hop_seconds).round() as usize;
        let lo = expected.saturating_sub(snap_radius);
        let hi = (expected + snap_radius).min(envelope.len() - 1);

        let snapped = arg_max(envelope, lo, hi);
        let snapped_time = snapped as f64 * hop_seconds;

        let spaced = beats
            .last()
            .map_or(true, |&last| snapped_time - last > beat_period_seconds * 0.5);
        if spaced {
            beats.push(snapped_time);
        }

        t += beat_period_seconds;
    }

    Ok(beats)
}

/// Index of the maximum in `values[start..=end]`; the first maximum wins.
/// Returns `start` unchanged when the range lies outside the slice.
fn arg_max(values: &[f32], start: usize, end_inclusive: usize) -> usize {
    let mut best = start;
    let mut best_value = f32::NEG_INFINITY;

    let end = end_inclusive.min(values.len().saturating_sub(1));
    for (i, &value) in values.iter().enumerate().take(end + 1).skip(start) {
        if value > best_value {
            best_value = value;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44_100;
    const HOP: usize = 512;
    const SNAP: f64 = 0.12;

    fn token() -> CancelToken {
        CancelToken::new()
    }

    fn hop_seconds() -> f64 {
        HOP as f64 / SAMPLE_RATE as f64
    }

    /// Envelope with unit peaks every `period` frames starting at `offset`.
    fn peaky_envelope(len: usize, period: usize, offset: usize) -> Vec<f64> {
        // f64 for convenience of the callers below
        let mut envelope = vec![0.0f64; len];
        let mut pos = offset;
        while pos < len {
            envelope[pos] = 1.0;
            pos += period;
        }
        envelope
    }

    fn as_f32(values: &[f64]) -> Vec<f32> {
        values.iter().map(|&v| v as f32).collect()
    }

    #[test]
    fn empty_envelope_yields_empty_grid() {
        let beats = track(&[], SAMPLE_RATE, HOP, 60.0, 0.5, SNAP, &token()).unwrap();
        assert!(beats.is_empty());
    }

    #[test]
    fn beats_are_strictly_increasing_and_spaced() {
        let envelope = as_f32(&peaky_envelope(900, 43, 10));
        let duration = 900.0 * hop_seconds();
        let beats = track(&envelope, SAMPLE_RATE, HOP, duration, 0.5, SNAP, &token()).unwrap();

        assert!(!beats.is_empty());
        for pair in beats.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] > 0.25, "gap {} too small", pair[1] - pair[0]);
        }
    }

    #[test]
    fn beats_snap_onto_envelope_peaks() {
        let envelope = as_f32(&peaky_envelope(900, 43, 10));
        let duration = 900.0 * hop_seconds();
        let beats = track(&envelope, SAMPLE_RATE, HOP, duration, 0.5, SNAP, &token()).unwrap();

        for &beat in &beats {
            let frame = (beat / hop_seconds()).round() as usize;
            assert_eq!(
                envelope[frame], 1.0,
                "beat at {:.3}s (frame {}) is not on a peak",
                beat, frame
            );
        }
    }

    #[test]
    fn anchor_lands_on_the_strongest_early_peak() {
        // lone strong attack at frame 50, weaker peaks later
        let mut envelope = vec![0.1f32; 600];
        envelope[50] = 1.0;
        let duration = 600.0 * hop_seconds();
        let beats = track(&envelope, SAMPLE_RATE, HOP, duration, 0.5, SNAP, &token()).unwrap();

        let expected = 50.0 * hop_seconds();
        assert!((beats[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn cancellation_aborts_tracking() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let envelope = as_f32(&peaky_envelope(900, 43, 10));
        let err = track(&envelope, SAMPLE_RATE, HOP, 10.0, 0.5, SNAP, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn arg_max_prefers_the_first_maximum() {
        let values = [0.0f32, 1.0, 1.0, 0.5];
        assert_eq!(arg_max(&values, 0, 3), 1);
        assert_eq!(arg_max(&values, 2, 3), 2);
        // out-of-range start falls through unchanged
        assert_eq!(arg_max(&values, 10, 12), 10);
    }
}
