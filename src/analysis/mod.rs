//! Audio analysis pipeline
//!
//! Data flows strictly forward: PCM samples -> onset envelope -> tempo
//! estimate -> beat grid. Each stage is a pure function over its inputs;
//! [`analyze`] composes the three for callers that want the whole pulse
//! analysis in one call.

pub mod beats;
pub mod onset;
pub mod tempo;

use std::path::Path;

use crate::cancel::CancelToken;
use crate::config::AnalysisParams;
use crate::error::{BeatcutError, Result};
use crate::types::{AudioAnalysis, TempoEstimate};

/// Iterator adapter that counts how many samples pass through it, so the
/// track duration can be derived from what the extractor actually consumed.
struct CountingIter<I> {
    inner: I,
    consumed: u64,
}

impl<I: Iterator<Item = f32>> Iterator for CountingIter<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let item = self.inner.next();
        if item.is_some() {
            self.consumed += 1;
        }
        item
    }
}

/// Run the full rhythmic analysis over a mono sample stream.
///
/// The stream is consumed incrementally; only the onset envelope (one value
/// per hop) is kept in memory.
pub fn analyze<I>(
    source_path: &Path,
    samples: I,
    sample_rate: u32,
    params: &AnalysisParams,
    cancel: &CancelToken,
) -> Result<AudioAnalysis>
where
    I: IntoIterator<Item = f32>,
{
    params.validate()?;
    if sample_rate == 0 {
        return Err(BeatcutError::Config("sample rate must be positive".into()));
    }

    let mut counting = CountingIter {
        inner: samples.into_iter(),
        consumed: 0,
    };

    let envelope = onset::extract(&mut counting, params.window_size, params.hop_size, cancel)?;
    let duration_seconds = counting.consumed as f64 / sample_rate as f64;

    let bpm = tempo::estimate(
        &envelope,
        sample_rate,
        params.hop_size,
        params.min_bpm,
        params.max_bpm,
        cancel,
    )?;
    let tempo = TempoEstimate::from_bpm(bpm);

    let beat_times = beats::track(
        &envelope,
        sample_rate,
        params.hop_size,
        duration_seconds,
        tempo.beat_period_seconds,
        params.snap_window_seconds,
        cancel,
    )?;

    Ok(AudioAnalysis {
        source_path: source_path.to_path_buf(),
        duration_seconds,
        sample_rate,
        hop_size: params.hop_size,
        bpm: tempo.bpm,
        beat_period_seconds: tempo.beat_period_seconds,
        onset_envelope: envelope,
        beat_times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Clicks at the given BPM: short decaying bursts over silence.
    fn click_signal(bpm: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
        let len = (seconds * sample_rate as f64) as usize;
        let samples_per_beat = (60.0 / bpm * sample_rate as f64) as usize;
        let click_len = (0.005 * sample_rate as f64) as usize;

        let mut signal = vec![0.0f32; len];
        for (i, sample) in signal.iter_mut().enumerate() {
            let position_in_beat = i % samples_per_beat;
            if position_in_beat < click_len {
                let decay = (-5.0 * position_in_beat as f32 / click_len as f32).exp();
                *sample = 0.8 * decay;
            }
        }
        signal
    }

    #[test]
    fn empty_stream_degrades_gracefully() {
        let analysis = analyze(
            Path::new("silent.wav"),
            std::iter::empty(),
            44_100,
            &AnalysisParams::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(analysis.onset_envelope.is_empty());
        assert!(analysis.beat_times.is_empty());
        assert_eq!(analysis.duration_seconds, 0.0);
        // too little data for autocorrelation -> fixed fallback
        assert_eq!(analysis.bpm, tempo::FALLBACK_BPM);
    }

    #[test]
    fn click_track_produces_a_coherent_analysis() {
        let signal = click_signal(120.0, 10.0, 44_100);
        let expected_duration = signal.len() as f64 / 44_100.0;

        let analysis = analyze(
            Path::new("clicks.wav"),
            signal,
            44_100,
            &AnalysisParams::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!((analysis.duration_seconds - expected_duration).abs() < 1e-9);
        assert!(
            (analysis.bpm - 120.0).abs() < 5.0,
            "bpm was {}",
            analysis.bpm
        );
        assert!((analysis.beat_period_seconds - 60.0 / analysis.bpm).abs() < 1e-12);
        assert!(analysis.onset_envelope.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(!analysis.beat_times.is_empty());
        for pair in analysis.beat_times.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] > analysis.beat_period_seconds * 0.5);
        }
    }

    #[test]
    fn invalid_params_fail_before_any_processing() {
        let params = AnalysisParams {
            min_bpm: 200.0,
            max_bpm: 100.0,
            ..Default::default()
        };
        let err = analyze(
            Path::new("x.wav"),
            vec![0.0f32; 1000],
            44_100,
            &params,
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BeatcutError::Config(_)));
    }
}
