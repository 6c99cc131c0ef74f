//! Streaming audio decoding using symphonia
//!
//! Decodes audio files to mono f32 samples lazily: packets are pulled and
//! mixed down on demand as the iterator is consumed, so a track is never
//! materialized in memory. Multi-channel sources are averaged to mono.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace, warn};

use crate::error::{BeatcutError, Result};

/// Lazily decoded mono sample stream over one audio track.
///
/// Iterate to pull samples; [`SampleStream::samples_read`] reports how many
/// have been produced so far, which after exhaustion is the exact track
/// length in samples.
pub struct SampleStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    pending: Vec<f32>,
    pos: usize,
    samples_read: u64,
    finished: bool,
}

/// Open an audio file for streaming mono decode.
pub fn open(path: &Path) -> Result<SampleStream> {
    let file = std::fs::File::open(path)
        .map_err(|e| BeatcutError::decode_error(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Provide a hint based on file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| BeatcutError::decode_error(path, format!("Failed to probe format: {}", e)))?;

    let format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| BeatcutError::decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params.sample_rate.unwrap_or(44_100);
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        sample_rate,
        channels
    );

    let decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| {
            BeatcutError::decode_error(path, format!("Failed to create decoder: {}", e))
        })?;

    Ok(SampleStream {
        format,
        decoder,
        track_id,
        sample_rate,
        pending: Vec::new(),
        pos: 0,
        samples_read: 0,
        finished: false,
    })
}

impl SampleStream {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Mono samples produced so far
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    /// Seconds of audio produced so far
    pub fn seconds_read(&self) -> f64 {
        self.samples_read as f64 / self.sample_rate as f64
    }

    /// Decode packets until some mono samples are pending or the stream ends.
    fn refill(&mut self) {
        self.pending.clear();
        self.pos = 0;

        while !self.finished && self.pending.is_empty() {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return;
                }
                Err(e) => {
                    warn!("Stopping decode early: {}", e);
                    self.finished = true;
                    return;
                }
            };

            // Skip packets from other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // Skip corrupted frames
                    trace!("Skipping corrupted frame: {}", e);
                    continue;
                }
                Err(e) => {
                    warn!("Stopping decode early: {}", e);
                    self.finished = true;
                    return;
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            if num_frames == 0 {
                continue;
            }

            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            let channels = spec.channels.count();
            self.pending = to_mono(sample_buf.samples(), channels);
        }
    }
}

impl Iterator for SampleStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        loop {
            if self.pos < self.pending.len() {
                let sample = self.pending[self.pos];
                self.pos += 1;
                self.samples_read += 1;
                return Some(sample);
            }
            if self.finished {
                return None;
            }
            self.refill();
        }
    }
}

impl std::fmt::Debug for SampleStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStream")
            .field("track_id", &self.track_id)
            .field("sample_rate", &self.sample_rate)
            .field("samples_read", &self.samples_read)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Convert interleaved multi-channel audio to mono
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<f32>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for frame in frames {
            for &sample in frame {
                writer
                    .write_sample((sample * 32767.0) as i16)
                    .expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn streams_mono_wav_samples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        let frames: Vec<Vec<f32>> = (0..8000).map(|_| vec![0.25]).collect();
        write_wav(&path, 1, 8000, &frames);

        let mut stream = open(&path).unwrap();
        assert_eq!(stream.sample_rate(), 8000);

        let samples: Vec<f32> = (&mut stream).collect();
        assert_eq!(samples.len(), 8000);
        assert_eq!(stream.samples_read(), 8000);
        assert!((stream.seconds_read() - 1.0).abs() < 1e-9);
        assert!(samples.iter().all(|&s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn averages_stereo_to_mono() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<Vec<f32>> = (0..4000).map(|_| vec![0.5, -0.5]).collect();
        write_wav(&path, 2, 8000, &frames);

        let stream = open(&path).unwrap();
        let samples: Vec<f32> = stream.collect();
        assert_eq!(samples.len(), 4000);
        assert!(samples.iter().all(|&s| s.abs() < 1e-3));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = open(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, BeatcutError::Decode { .. }));
    }

    #[test]
    fn to_mono_averages_channels() {
        let mono = to_mono(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
        assert_eq!(to_mono(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }
}
