//! Pipeline services and external-tool adapters

pub mod audio_acquirer;
pub mod classifier;
pub mod pipeline;
pub mod vocal_isolator;
pub mod workspace;

pub use audio_acquirer::{AcquisitionError, AudioAcquirer, YtDlpAcquirer};
pub use classifier::{Classifier, ClassifierError, ClassifierService};
pub use pipeline::{
    ClassificationPipeline, PipelineConfigError, PipelineError, PipelineSettings, PipelineStage,
    WaveformRole, DEFAULT_PREFIX_DIMENSIONS,
};
pub use vocal_isolator::{DemucsIsolator, Isolation, IsolationError, VocalIsolator};
pub use workspace::RequestWorkspace;
