//! Data models for vcd-detect

pub mod audio;
pub mod classification;

pub use audio::{Embedding, FeatureVector, WaveformFile};
pub use classification::{ClassificationResult, Label};
