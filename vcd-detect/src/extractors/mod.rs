//! Feature extractors
//!
//! An extractor turns a [`WaveformFile`] into an [`Embedding`]. Failing to
//! compute one (empty or too-short audio, undecodable file) is an expected
//! outcome reported as [`Extraction::Unavailable`], never a panic or an error
//! the caller has to unwind.

pub mod mfcc_extractor;
pub mod spectrogram;

pub use mfcc_extractor::{MfccExtractor, MIN_SAMPLES};
pub use spectrogram::N_MFCC;

use crate::models::{Embedding, WaveformFile};

/// Outcome of one extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Embedding(Embedding),
    /// Embedding not computable; the reason is for logs
    Unavailable(String),
}

impl Extraction {
    pub fn into_embedding(self) -> Option<Embedding> {
        match self {
            Extraction::Embedding(embedding) => Some(embedding),
            Extraction::Unavailable(_) => None,
        }
    }
}

/// Waveform → embedding
///
/// Implementations are pure and CPU-bound; the pipeline runs them on the
/// blocking thread pool.
pub trait FeatureExtractor: Send + Sync {
    /// Extractor name for logs
    fn name(&self) -> &'static str;

    /// Number of values in every embedding this extractor produces
    fn embedding_len(&self) -> usize;

    fn extract(&self, waveform: &WaveformFile) -> Extraction;
}
