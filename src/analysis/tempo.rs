//! Tempo estimation via autocorrelation of the onset envelope
//!
//! The envelope is mean-centered (a small whitening step so the correlation
//! reflects periodicity rather than absolute energy) and correlated against
//! itself over the lag range corresponding to the BPM search window. Tempo
//! estimation from onset curves is ambiguous between a tempo and its
//! double/half, so the winning BPM is folded into the caller's range by
//! repeated doubling/halving.

use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::{BeatcutError, Result};

/// Returned when the envelope is too short for reliable autocorrelation
pub const FALLBACK_BPM: f64 = 120.0;

/// Minimum number of envelope frames required for autocorrelation
const MIN_ENVELOPE_FRAMES: usize = 10;

/// Estimate the tempo of an onset envelope, in BPM.
///
/// The result is folded into `[min_bpm, max_bpm]`. Envelopes shorter than
/// ten frames return [`FALLBACK_BPM`], a valid degenerate output rather
/// than an error.
pub fn estimate(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f64,
    max_bpm: f64,
    cancel: &CancelToken,
) -> Result<f64> {
    if sample_rate == 0 || hop_size == 0 {
        return Err(BeatcutError::Config(
            "sample rate and hop size must be positive".into(),
        ));
    }
    if min_bpm <= 0.0 || max_bpm <= 0.0 {
        return Err(BeatcutError::Config("BPM bounds must be positive".into()));
    }
    if min_bpm >= max_bpm {
        return Err(BeatcutError::Config(format!(
            "min BPM ({}) must be below max BPM ({})",
            min_bpm, max_bpm
        )));
    }
    cancel.check()?;

    if envelope.len() < MIN_ENVELOPE_FRAMES {
        return Ok(FALLBACK_BPM);
    }

    // Larger BPM -> smaller lag, so the bounds swap.
    let frames_per_second = sample_rate as f64 / hop_size as f64;
    let min_lag = (((60.0 / max_bpm) * frames_per_second).round() as usize).max(1);
    let max_lag = (((60.0 / min_bpm) * frames_per_second).round() as usize).min(envelope.len() - 1);

    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / envelope.len() as f64;

    let mut best_score = f64::NEG_INFINITY;
    let mut best_lag = (min_lag + max_lag) / 2;

    if min_lag <= max_lag {
        // Per-lag dot products are independent; compute them in parallel and
        // keep the ascending-order scan so ties go to the smaller lag.
        let scores: Vec<f64> = (min_lag..=max_lag)
            .into_par_iter()
            .map(|lag| {
                if cancel.is_cancelled() {
                    return f64::NEG_INFINITY;
                }
                autocorrelation_score(envelope, mean, lag)
            })
            .collect();
        cancel.check()?;

        for (offset, &score) in scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best_lag = min_lag + offset;
            }
        }
    }

    // degenerate lag range
    let best_lag = best_lag.max(1);

    let mut bpm = 60.0 * sample_rate as f64 / (hop_size as f64 * best_lag as f64);

    // octave folding into the caller's expected range
    while bpm < min_bpm {
        bpm *= 2.0;
    }
    while bpm > max_bpm {
        bpm /= 2.0;
    }

    Ok(bpm)
}

fn autocorrelation_score(envelope: &[f32], mean: f64, lag: usize) -> f64 {
    let mut score = 0.0;
    for i in 0..envelope.len() - lag {
        let a = envelope[i] as f64 - mean;
        let b = envelope[i + lag] as f64 - mean;
        score += a * b;
    }
    score
}
