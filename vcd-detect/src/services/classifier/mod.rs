//! Classifier service
//!
//! Loads the fitted scaler and classifier once at startup and exposes
//! `classify(feature_vector) -> (label, probability)`. Both artifacts are
//! immutable after load and shared read-only across concurrent requests.
//!
//! Every load-time problem (missing file, malformed JSON, inconsistent
//! parameters, width disagreement) is a configuration fault: the service must
//! not start with artifacts it cannot use.

pub mod model;
pub mod scaler;

pub use model::{ClassifierState, DecisionTree};
pub use scaler::ScalerState;

use crate::models::{ClassificationResult, FeatureVector, Label};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Classifier configuration faults
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Artifact file could not be read
    #[error("failed to read model artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact file is not valid JSON for its type
    #[error("failed to parse model artifact {path}: {source}")]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but its parameters are unusable
    #[error("invalid {artifact}: {reason}")]
    InvalidArtifact {
        artifact: &'static str,
        reason: String,
    },

    /// Feature width disagreement between vector, scaler and classifier
    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Classifier produced a decision outside {0, 1}
    #[error("classifier produced unknown decision value {0}")]
    UnknownDecision(i64),
}

/// Feature vector → verdict
pub trait Classifier: Send + Sync {
    /// Width of the feature vectors this classifier accepts
    fn n_features(&self) -> usize;

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError>;
}

/// Scaler + classifier loaded from persisted artifacts
#[derive(Debug, Clone)]
pub struct ClassifierService {
    scaler: ScalerState,
    model: ClassifierState,
}

impl ClassifierService {
    /// Build from in-memory artifacts, validating both and their agreement
    pub fn new(scaler: ScalerState, model: ClassifierState) -> Result<Self, ClassifierError> {
        scaler
            .validate()
            .map_err(|reason| ClassifierError::InvalidArtifact {
                artifact: "scaler",
                reason,
            })?;
        model
            .validate()
            .map_err(|reason| ClassifierError::InvalidArtifact {
                artifact: "classifier",
                reason,
            })?;

        if scaler.n_features() != model.n_features() {
            return Err(ClassifierError::DimensionMismatch {
                expected: model.n_features(),
                actual: scaler.n_features(),
            });
        }

        Ok(Self { scaler, model })
    }

    /// Load both artifacts and check them against the pipeline's feature width
    pub fn load(
        scaler_path: &Path,
        classifier_path: &Path,
        expected_features: usize,
    ) -> Result<Self, ClassifierError> {
        let scaler: ScalerState = read_artifact(scaler_path)?;
        let model: ClassifierState = read_artifact(classifier_path)?;
        let service = Self::new(scaler, model)?;

        if service.n_features() != expected_features {
            return Err(ClassifierError::DimensionMismatch {
                expected: expected_features,
                actual: service.n_features(),
            });
        }

        info!(
            scaler = %scaler_path.display(),
            classifier = %classifier_path.display(),
            n_features = service.n_features(),
            "Model artifacts loaded"
        );
        Ok(service)
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierError> {
    let content = std::fs::read_to_string(path).map_err(|source| ClassifierError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ClassifierError::ArtifactParse {
        path: path.to_path_buf(),
        source,
    })
}

impl Classifier for ClassifierService {
    fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        if features.len() != self.n_features() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        // Fitted training-time parameters, never re-fitted here
        let scaled = self.scaler.transform(features.as_slice());
        let (decision, probability) = self.model.predict(&scaled);
        let label = Label::from_decision(decision).ok_or(ClassifierError::UnknownDecision(decision))?;

        debug!(decision = decision, probability = probability, "Classifier decision");

        Ok(ClassificationResult {
            label,
            probability: probability.clamp(0.0, 1.0),
        })
    }
}
