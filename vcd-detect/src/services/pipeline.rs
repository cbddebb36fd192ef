//! Classification pipeline orchestrator
//!
//! One request is one strictly sequential run:
//!
//! ```text
//! Idle → Acquiring → Isolating → Extracting → Assembling → Scaling → Classifying
//!                                                                         │
//!                   any failure ─────────────────────────────► CleaningUp ◄┘
//!                                                                  │
//!                                                     Done(success) | Done(failure)
//! ```
//!
//! Each transition is gated on the previous stage's explicit success, so the
//! classifier never sees stale or partial data. `CleaningUp` is reached on every
//! path: explicitly on return, through `Drop` of the request workspace when the
//! run is cancelled or unwinds.
//!
//! Collaborators sit behind traits and are injected at construction; model
//! artifacts are loaded once by the caller and shared read-only.

use crate::extractors::{Extraction, FeatureExtractor};
use crate::models::{ClassificationResult, Embedding, FeatureVector, WaveformFile};
use crate::services::audio_acquirer::{AcquisitionError, AudioAcquirer};
use crate::services::classifier::{Classifier, ClassifierError};
use crate::services::vocal_isolator::{Isolation, IsolationError, VocalIsolator};
use crate::services::workspace::RequestWorkspace;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Number of leading embedding coefficients taken from each waveform
///
/// The fitted artifacts were trained on 6 + 6 features. Why only a prefix of
/// the 40 coefficients is used is not documented by the training side; any
/// change here must be matched by re-exported artifacts.
pub const DEFAULT_PREFIX_DIMENSIONS: usize = 6;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Acquiring,
    Isolating,
    Extracting,
    Assembling,
    Scaling,
    Classifying,
    CleaningUp,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Acquiring => "acquiring",
            PipelineStage::Isolating => "isolating",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Scaling => "scaling",
            PipelineStage::Classifying => "classifying",
            PipelineStage::CleaningUp => "cleaning_up",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Which waveform an embedding was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformRole {
    Original,
    IsolatedVocal,
}

impl fmt::Display for WaveformRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveformRole::Original => f.write_str("original"),
            WaveformRole::IsolatedVocal => f.write_str("isolated vocal"),
        }
    }
}

/// Failure outcome of a run
///
/// `Display` is the stable, caller-facing cause. Tool diagnostics live in the
/// sources and are only logged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download failed")]
    Acquisition(#[from] AcquisitionError),

    #[error("download failed")]
    AcquisitionTimeout(Duration),

    #[error("vocal separation failed")]
    Isolation(#[from] IsolationError),

    #[error("vocal separation failed")]
    IsolationTimeout(Duration),

    #[error("vocal separation failed")]
    NoVocalFound,

    #[error("embedding extraction failed")]
    ExtractionUnavailable { role: WaveformRole, reason: String },

    /// Artifacts and pipeline disagree at runtime; never the caller's fault
    #[error("classifier configuration fault: {0}")]
    Classification(#[from] ClassifierError),

    #[error("failed to prepare working storage: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stage the run was in when it failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Acquisition(_) | PipelineError::AcquisitionTimeout(_) => {
                PipelineStage::Acquiring
            }
            PipelineError::Isolation(_)
            | PipelineError::IsolationTimeout(_)
            | PipelineError::NoVocalFound => PipelineStage::Isolating,
            PipelineError::ExtractionUnavailable { .. } => PipelineStage::Extracting,
            PipelineError::Classification(_) => PipelineStage::Classifying,
            PipelineError::Workspace(_) => PipelineStage::Idle,
            PipelineError::Internal(_) => PipelineStage::Assembling,
        }
    }

    /// Faults that are not a property of the submitted audio
    ///
    /// These are reported to callers as an opaque internal error.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PipelineError::Classification(_)
                | PipelineError::Workspace(_)
                | PipelineError::Internal(_)
        )
    }
}

/// Invalid pipeline wiring, detected at construction
#[derive(Debug, Error)]
pub enum PipelineConfigError {
    #[error("prefix_dimensions must be between 1 and {embedding_len}, got {prefix}")]
    InvalidPrefix { prefix: usize, embedding_len: usize },

    #[error("classifier expects {classifier} features but pipeline assembles {pipeline}")]
    FeatureWidth { classifier: usize, pipeline: usize },

    #[error("{0} timeout must be non-zero")]
    ZeroTimeout(&'static str),
}

/// Tunables for a pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Parent of all per-request workspaces
    pub work_root: PathBuf,
    pub prefix_dimensions: usize,
    pub acquisition_timeout: Duration,
    pub isolation_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            work_root: std::env::temp_dir().join("vcd-detect"),
            prefix_dimensions: DEFAULT_PREFIX_DIMENSIONS,
            acquisition_timeout: Duration::from_secs(300),
            isolation_timeout: Duration::from_secs(600),
        }
    }
}

/// End-to-end classifier for one URL per run
pub struct ClassificationPipeline {
    acquirer: Arc<dyn AudioAcquirer>,
    isolator: Arc<dyn VocalIsolator>,
    extractor: Arc<dyn FeatureExtractor>,
    classifier: Arc<dyn Classifier>,
    settings: PipelineSettings,
}

impl ClassificationPipeline {
    pub fn new(
        acquirer: Arc<dyn AudioAcquirer>,
        isolator: Arc<dyn VocalIsolator>,
        extractor: Arc<dyn FeatureExtractor>,
        classifier: Arc<dyn Classifier>,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineConfigError> {
        let embedding_len = extractor.embedding_len();
        let prefix = settings.prefix_dimensions;
        if prefix == 0 || prefix > embedding_len {
            return Err(PipelineConfigError::InvalidPrefix {
                prefix,
                embedding_len,
            });
        }
        if classifier.n_features() != 2 * prefix {
            return Err(PipelineConfigError::FeatureWidth {
                classifier: classifier.n_features(),
                pipeline: 2 * prefix,
            });
        }
        if settings.acquisition_timeout.is_zero() {
            return Err(PipelineConfigError::ZeroTimeout("acquisition"));
        }
        if settings.isolation_timeout.is_zero() {
            return Err(PipelineConfigError::ZeroTimeout("isolation"));
        }

        Ok(Self {
            acquirer,
            isolator,
            extractor,
            classifier,
            settings,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Classify the audio behind `url` under a fresh request id
    pub async fn run(&self, url: &str) -> Result<ClassificationResult, PipelineError> {
        self.run_with_id(Uuid::new_v4(), url).await
    }

    /// Classify the audio behind `url`; `request_id` scopes logs and storage
    pub async fn run_with_id(
        &self,
        request_id: Uuid,
        url: &str,
    ) -> Result<ClassificationResult, PipelineError> {
        let span = info_span!("pipeline", request_id = %request_id);
        async move {
            info!(url = %url, "Classification requested");

            let workspace = RequestWorkspace::create(&self.settings.work_root, request_id)
                .map_err(PipelineError::Workspace)?;

            let outcome = self.execute(url, &workspace).await;

            enter(PipelineStage::CleaningUp);
            workspace.cleanup();
            enter(PipelineStage::Done);

            match &outcome {
                Ok(result) => info!(
                    label = %result.label,
                    probability = result.probability,
                    "Classification complete"
                ),
                Err(err) => warn!(
                    stage = %err.stage(),
                    cause = %err,
                    detail = ?err,
                    "Classification failed"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        url: &str,
        workspace: &RequestWorkspace,
    ) -> Result<ClassificationResult, PipelineError> {
        enter(PipelineStage::Acquiring);
        let limit = self.settings.acquisition_timeout;
        let original = timeout(limit, self.acquirer.acquire(url, workspace.downloads_dir()))
            .await
            .map_err(|_| PipelineError::AcquisitionTimeout(limit))??;

        enter(PipelineStage::Isolating);
        let limit = self.settings.isolation_timeout;
        let isolation = timeout(limit, self.isolator.isolate(&original, workspace.separation_dir()))
            .await
            .map_err(|_| PipelineError::IsolationTimeout(limit))??;
        let vocals = match isolation {
            Isolation::Vocals(vocals) => vocals,
            Isolation::NoVocalFound => return Err(PipelineError::NoVocalFound),
        };

        enter(PipelineStage::Extracting);
        let original_embedding = self.extract(WaveformRole::Original, original).await?;
        let vocal_embedding = self.extract(WaveformRole::IsolatedVocal, vocals).await?;

        enter(PipelineStage::Assembling);
        let prefix = self.settings.prefix_dimensions;
        for embedding in [&original_embedding, &vocal_embedding] {
            if embedding.len() < prefix {
                return Err(PipelineError::Internal(format!(
                    "{} extractor returned {} values, prefix needs {}",
                    self.extractor.name(),
                    embedding.len(),
                    prefix
                )));
            }
        }
        let features = FeatureVector::assemble(&original_embedding, &vocal_embedding, prefix);
        debug!(features = ?features.as_slice(), "Feature vector assembled");

        // Scaling is applied by the classifier service with its fitted parameters
        enter(PipelineStage::Scaling);
        enter(PipelineStage::Classifying);
        Ok(self.classifier.classify(&features)?)
    }

    /// Run the CPU-bound extractor on the blocking pool
    async fn extract(
        &self,
        role: WaveformRole,
        waveform: WaveformFile,
    ) -> Result<Embedding, PipelineError> {
        let extractor = Arc::clone(&self.extractor);
        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&waveform))
            .await
            .map_err(|e| PipelineError::Internal(format!("{} extraction task failed: {}", role, e)))?;

        match extraction {
            Extraction::Embedding(embedding) => Ok(embedding),
            Extraction::Unavailable(reason) => {
                Err(PipelineError::ExtractionUnavailable { role, reason })
            }
        }
    }
}

fn enter(stage: PipelineStage) {
    debug!(stage = %stage, "Pipeline stage");
}
