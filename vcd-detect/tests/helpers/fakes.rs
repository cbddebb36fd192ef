//! Stand-in pipeline collaborators
//!
//! The fakes honor the same contracts as the real adapters (files written
//! into the given directories, Demucs-style output layout) without touching
//! the network or external tools.

use super::audio_generator::{generate_test_wav, AudioConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vcd_detect::extractors::MfccExtractor;
use vcd_detect::models::{ClassificationResult, FeatureVector, Label, WaveformFile};
use vcd_detect::services::{
    AcquisitionError, AudioAcquirer, ClassificationPipeline, Classifier, ClassifierError,
    Isolation, IsolationError, PipelineSettings, VocalIsolator,
};

/// How [`FakeAcquirer`] behaves
#[derive(Debug, Clone)]
pub enum AcquirerMode {
    /// Write `clip.wav` with this content into the downloads directory
    Wav(AudioConfig),
    /// Tool reported failure
    Fail,
    /// Never completes
    Hang,
}

/// Audio acquirer that synthesizes its download
pub struct FakeAcquirer {
    mode: AcquirerMode,
    /// Directories the pipeline handed out, in call order
    pub workdirs: Mutex<Vec<PathBuf>>,
}

impl FakeAcquirer {
    pub fn new(mode: AcquirerMode) -> Self {
        Self {
            mode,
            workdirs: Mutex::new(Vec::new()),
        }
    }

    pub fn clip() -> Self {
        Self::new(AcquirerMode::Wav(AudioConfig::default()))
    }

    pub fn seen_workdirs(&self) -> Vec<PathBuf> {
        self.workdirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioAcquirer for FakeAcquirer {
    async fn acquire(&self, _url: &str, workdir: &Path) -> Result<WaveformFile, AcquisitionError> {
        self.workdirs.lock().unwrap().push(workdir.to_path_buf());
        match &self.mode {
            AcquirerMode::Wav(config) => {
                let path = workdir.join("clip.wav");
                generate_test_wav(&path, config).unwrap();
                Ok(WaveformFile::new(path))
            }
            AcquirerMode::Fail => Err(AcquisitionError::ToolFailed {
                code: Some(1),
                stderr: "ERROR: Unsupported URL".to_string(),
            }),
            AcquirerMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// How [`FakeIsolator`] behaves
#[derive(Debug, Clone)]
pub enum IsolatorMode {
    /// Write vocals with this content at the Demucs output path
    Vocals(AudioConfig),
    NoVocals,
    Fail,
    Hang,
    /// Crashes mid-separation
    Panic,
}

/// Vocal isolator that writes Demucs-shaped output
pub struct FakeIsolator {
    mode: IsolatorMode,
    pub calls: AtomicUsize,
}

impl FakeIsolator {
    pub fn new(mode: IsolatorMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn vocals() -> Self {
        Self::new(IsolatorMode::Vocals(AudioConfig {
            frequency: 880.0,
            ..AudioConfig::default()
        }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VocalIsolator for FakeIsolator {
    async fn isolate(
        &self,
        input: &WaveformFile,
        output_root: &Path,
    ) -> Result<Isolation, IsolationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            IsolatorMode::Vocals(config) => {
                let stem = input.stem().unwrap_or("input");
                let dir = output_root.join("htdemucs").join(stem);
                std::fs::create_dir_all(&dir).unwrap();
                let path = dir.join("vocals.wav");
                generate_test_wav(&path, config).unwrap();
                Ok(Isolation::Vocals(WaveformFile::new(path)))
            }
            IsolatorMode::NoVocals => {
                std::fs::create_dir_all(output_root.join("htdemucs")).unwrap();
                Ok(Isolation::NoVocalFound)
            }
            IsolatorMode::Fail => Err(IsolationError::ToolFailed {
                code: Some(1),
                stderr: "RuntimeError: model not found".to_string(),
            }),
            IsolatorMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            IsolatorMode::Panic => panic!("separator crashed"),
        }
    }
}

/// Classifier that records its inputs and returns a fixed verdict
pub struct CountingClassifier {
    n_features: usize,
    result: ClassificationResult,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<Vec<f64>>>,
}

impl CountingClassifier {
    pub fn new(n_features: usize) -> Self {
        Self::with_result(
            n_features,
            ClassificationResult {
                label: Label::Ai,
                probability: 0.87,
            },
        )
    }

    pub fn with_result(n_features: usize, result: ClassificationResult) -> Self {
        Self {
            n_features,
            result,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for CountingClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(features.as_slice().to_vec());
        Ok(self.result)
    }
}

/// Classifier whose model answers with a decision outside the label set
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn n_features(&self) -> usize {
        12
    }

    fn classify(&self, _: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        Err(ClassifierError::UnknownDecision(2))
    }
}

/// Default settings rooted in `work_root`, with short timeouts
pub fn test_settings(work_root: &Path) -> PipelineSettings {
    PipelineSettings {
        work_root: work_root.to_path_buf(),
        prefix_dimensions: 6,
        acquisition_timeout: Duration::from_secs(30),
        isolation_timeout: Duration::from_secs(30),
    }
}

/// Pipeline over the given fakes and the real MFCC extractor
pub fn pipeline_with(
    acquirer: Arc<FakeAcquirer>,
    isolator: Arc<FakeIsolator>,
    classifier: Arc<CountingClassifier>,
    settings: PipelineSettings,
) -> ClassificationPipeline {
    ClassificationPipeline::new(
        acquirer,
        isolator,
        Arc::new(MfccExtractor::new()),
        classifier,
        settings,
    )
    .unwrap()
}
