//! Audio Test Fixture Generator
//!
//! Utilities for generating WAV fixtures with known content

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Tone frequency in Hz; 0 writes silence
    pub frequency: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 22050,
            channels: 1,
            frequency: 440.0,
        }
    }
}

impl AudioConfig {
    /// Exactly `samples` frames at the default rate
    pub fn with_samples(samples: usize) -> Self {
        let config = Self::default();
        Self {
            duration_seconds: samples as f64 / config.sample_rate as f64,
            ..config
        }
    }
}

/// Generate a 16-bit PCM WAV file with specified configuration
///
/// Every channel carries the same tone.
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64).round() as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample = (0.3 * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
            * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write interleaved 32-bit float frames
pub fn write_float_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    interleaved: &[f32],
) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(path.to_path_buf())
}
