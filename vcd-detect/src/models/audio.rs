//! Audio artifacts flowing through the classification pipeline
//!
//! A [`WaveformFile`] is a decoded file on request-scoped storage. The
//! extractor turns it into an [`Embedding`]; two embeddings (original mix and
//! isolated vocal) are truncated and joined into the [`FeatureVector`] the
//! classifier consumes.

use std::fmt;
use std::path::{Path, PathBuf};

/// Decoded audio file on transient storage
///
/// Sample rate and channel count are implicit in the file header. The file is
/// owned by the pipeline run that created it and disappears with that run's
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformFile {
    path: PathBuf,
}

impl WaveformFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its extension (`/a/b/x1y2.wav` → `x1y2`)
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}

impl fmt::Display for WaveformFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Fixed-length spectral summary of one waveform
///
/// Produced once by the extractor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Classifier input: prefix of the original embedding followed by the same
/// size prefix of the isolated-vocal embedding
///
/// Length is always `2 × prefix_dimensions`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Concatenate the first `prefix` coefficients of each embedding,
    /// original first.
    ///
    /// # Panics
    /// If either embedding is shorter than `prefix`. Embedding size and prefix
    /// size are startup-validated constants, so this indicates a build
    /// misconfiguration rather than bad input.
    pub fn assemble(original: &Embedding, vocal: &Embedding, prefix: usize) -> Self {
        let values = original.as_slice()[..prefix]
            .iter()
            .chain(vocal.as_slice()[..prefix].iter())
            .map(|&v| f64::from(v))
            .collect();
        Self(values)
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(offset: f32) -> Embedding {
        Embedding::new((0..40).map(|i| offset + i as f32).collect())
    }

    #[test]
    fn test_assemble_orders_original_then_vocal() {
        let features = FeatureVector::assemble(&embedding(0.0), &embedding(100.0), 6);

        assert_eq!(features.len(), 12);
        assert_eq!(
            features.as_slice(),
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 100.0, 101.0, 102.0, 103.0, 104.0, 105.0]
        );
    }

    #[test]
    fn test_assemble_length_tracks_prefix() {
        for prefix in [1, 6, 13, 40] {
            let features = FeatureVector::assemble(&embedding(0.0), &embedding(1.0), prefix);
            assert_eq!(features.len(), 2 * prefix);
        }
    }

    #[test]
    #[should_panic]
    fn test_assemble_prefix_longer_than_embedding_panics() {
        let short = Embedding::new(vec![0.0; 4]);
        let _ = FeatureVector::assemble(&short, &short, 6);
    }

    #[test]
    fn test_waveform_stem() {
        let wav = WaveformFile::new("/tmp/work/downloads/dQw4w9WgXcQ.wav");
        assert_eq!(wav.stem(), Some("dQw4w9WgXcQ"));
    }
}
