//! Onset-strength envelope extraction
//!
//! The envelope is a per-hop curve of half-wave-rectified RMS energy rise:
//! it responds to percussive attacks and ignores decays. Extraction is
//! streaming: a fixed-size window buffer is shifted and refilled one hop at
//! a time, so arbitrarily long tracks are never materialized in memory.

use crate::cancel::CancelToken;
use crate::error::{BeatcutError, Result};

/// Radius of the moving-average smoothing filter, in frames
const SMOOTHING_RADIUS: usize = 6;

/// Maxima at or below this are treated as silence and left unscaled
const SILENCE_FLOOR: f32 = 1e-9;

/// Extract a normalized onset-strength envelope from a mono sample stream.
///
/// One value per hop; index `i` corresponds to time
/// `i * hop_size / sample_rate`. Values are in `[0, 1]` after normalization,
/// and the maximum is exactly 1 unless the raw curve was entirely zero.
///
/// An empty stream yields an empty envelope, and constant-energy input
/// yields an all-zero envelope; both are valid degenerate outputs, not
/// errors.
pub fn extract<I>(
    samples: I,
    window_size: usize,
    hop_size: usize,
    cancel: &CancelToken,
) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = f32>,
{
    if window_size == 0 || hop_size == 0 {
        return Err(BeatcutError::Config(
            "window and hop sizes must be positive".into(),
        ));
    }
    if hop_size >= window_size {
        return Err(BeatcutError::Config(format!(
            "hop size ({}) must be smaller than window size ({})",
            hop_size, window_size
        )));
    }

    let mut samples = samples.into_iter();
    let mut window = vec![0.0f32; window_size];

    let filled = fill(&mut window, &mut samples);
    if filled == 0 {
        return Ok(Vec::new());
    }

    let mut raw = Vec::with_capacity(1024);
    // The rectified difference needs a previous RMS for the first frame;
    // seeding it with the first window's own RMS keeps frame 0 at zero, so
    // constant-energy input produces an all-zero envelope.
    let mut prev_rms = rms(&window[..filled]);
    let mut frame_len = filled;

    loop {
        cancel.check()?;

        let current = rms(&window[..frame_len]);
        raw.push((current - prev_rms).max(0.0));
        prev_rms = current;

        // Advance by one hop: shift the window left, refill the tail.
        window.copy_within(hop_size.., 0);
        let tail = window_size - hop_size;
        let read = fill(&mut window[tail..], &mut samples);
        if read == 0 {
            break;
        }
        if read < hop_size {
            // stream exhausted mid-hop: zero-pad and emit one final frame
            window[tail + read..].fill(0.0);
        }
        frame_len = window_size;
    }

    let mut envelope = moving_average(&raw, SMOOTHING_RADIUS);
    normalize_in_place(&mut envelope);
    Ok(envelope)
}

/// Fill `buf` from the iterator, returning how many slots were written.
fn fill<I>(buf: &mut [f32], samples: &mut I) -> usize
where
    I: Iterator<Item = f32>,
{
    let mut written = 0;
    for slot in buf.iter_mut() {
        match samples.next() {
            Some(sample) => {
                *slot = sample;
                written += 1;
            }
            None => break,
        }
    }
    written
}

fn rms(buffer: &[f32]) -> f32 {
    let sum: f64 = buffer.iter().map(|&v| (v as f64) * (v as f64)).sum();
    (sum / buffer.len().max(1) as f64).sqrt() as f32
}

/// Symmetric moving average; edge frames average over the available
/// neighborhood instead of wrapping or zero-padding.
fn moving_average(values: &[f32], radius: usize) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut smoothed = vec![0.0f32; values.len()];
    for (i, out) in smoothed.iter_mut().enumerate() {
        let start = i.saturating_sub(radius);
        let end = (i + radius).min(values.len() - 1);
        let sum: f64 = values[start..=end].iter().map(|&v| v as f64).sum();
        *out = (sum / (end - start + 1) as f64) as f32;
    }
    smoothed
}

fn normalize_in_place(values: &mut [f32]) {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max <= SILENCE_FLOOR {
        return;
    }
    for value in values.iter_mut() {
        *value /= max;
    }
}
