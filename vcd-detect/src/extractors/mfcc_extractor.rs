//! MFCC embedding extractor
//!
//! Decodes a waveform, downmixes it to mono, and summarizes it as the
//! time-averaged 40-coefficient MFCC vector (see [`super::spectrogram`]).
//! Stereo information is discarded on purpose: the classifier was fitted on
//! mono embeddings.

use super::spectrogram::{MfccTransform, N_MFCC};
use super::{Extraction, FeatureExtractor};
use crate::models::{Embedding, WaveformFile};
use crate::utils::decode_audio_file;
use tracing::{debug, warn};

/// Shortest signal (in mono samples) considered stable enough to analyze
pub const MIN_SAMPLES: usize = 1000;

/// MFCC extractor with fixed transform parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct MfccExtractor;

impl MfccExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Embed already-decoded mono samples
    pub fn extract_samples(&self, samples: &[f32], sample_rate: u32) -> Extraction {
        if samples.is_empty() {
            return Extraction::Unavailable("waveform has no samples".to_string());
        }
        if samples.len() < MIN_SAMPLES {
            return Extraction::Unavailable(format!(
                "waveform too short: {} samples (minimum {})",
                samples.len(),
                MIN_SAMPLES
            ));
        }

        let coefficients = MfccTransform::new(sample_rate)
            .and_then(|transform| transform.mean_coefficients(samples));

        match coefficients {
            Ok(values) => Extraction::Embedding(Embedding::new(values)),
            Err(e) => Extraction::Unavailable(format!("MFCC transform failed: {}", e)),
        }
    }
}

impl FeatureExtractor for MfccExtractor {
    fn name(&self) -> &'static str {
        "MFCC"
    }

    fn embedding_len(&self) -> usize {
        N_MFCC
    }

    fn extract(&self, waveform: &WaveformFile) -> Extraction {
        let decoded = match decode_audio_file(waveform.path()) {
            Ok(decoded) => decoded,
            Err(e) => {
                let reason = format!("decode failed: {:#}", e);
                warn!(file = %waveform, reason = %reason, "Embedding unavailable");
                return Extraction::Unavailable(reason);
            }
        };

        debug!(
            file = %waveform,
            samples = decoded.samples.len(),
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            duration_seconds = format!("{:.2}", decoded.duration_seconds()),
            "Extracting MFCC embedding"
        );

        let extraction = self.extract_samples(&decoded.samples, decoded.sample_rate);
        if let Extraction::Unavailable(reason) = &extraction {
            warn!(file = %waveform, reason = %reason, "Embedding unavailable");
        }
        extraction
    }
}
