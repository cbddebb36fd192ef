//! Vocal isolation adapter
//!
//! Runs Demucs in two-stem mode (vocals vs. everything else) and maps its
//! directory convention to a single file:
//!
//! ```text
//! <output_root>/<model>/<input stem>/vocals.wav
//! ```
//!
//! Presence of that file is the only success signal. A clean exit without it
//! means the separator found no vocal content, which is reported separately
//! from a tool failure.

use crate::models::WaveformFile;
use crate::utils::process::{run_tool, stderr_tail, tool_command};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Demucs' default model; also names the first output directory level
pub const DEFAULT_MODEL: &str = "htdemucs";

const VOCALS_FILE: &str = "vocals.wav";

/// Isolation tool failures
#[derive(Debug, Error)]
pub enum IsolationError {
    /// Separator could not be started (typically not installed)
    #[error("failed to launch separator {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Separator exited non-zero
    #[error("separator exited with {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    /// Output directory could not be prepared
    #[error("failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input path has no usable base name
    #[error("input file {0} has no base name")]
    InvalidInput(PathBuf),
}

/// Outcome of a completed separation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isolation {
    Vocals(WaveformFile),
    /// Separator succeeded but produced no vocal stem
    NoVocalFound,
}

#[async_trait]
pub trait VocalIsolator: Send + Sync {
    async fn isolate(
        &self,
        input: &WaveformFile,
        output_root: &Path,
    ) -> Result<Isolation, IsolationError>;
}

/// Demucs command-line separator
#[derive(Debug, Clone)]
pub struct DemucsIsolator {
    program: PathBuf,
    model: String,
}

impl DemucsIsolator {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Where Demucs writes the vocal stem for `input`
    pub fn expected_vocals_path(&self, input: &WaveformFile, output_root: &Path) -> Option<PathBuf> {
        input.stem().map(|stem| {
            output_root
                .join(&self.model)
                .join(stem)
                .join(VOCALS_FILE)
        })
    }
}

impl Default for DemucsIsolator {
    fn default() -> Self {
        Self::new("demucs", DEFAULT_MODEL)
    }
}

#[async_trait]
impl VocalIsolator for DemucsIsolator {
    async fn isolate(
        &self,
        input: &WaveformFile,
        output_root: &Path,
    ) -> Result<Isolation, IsolationError> {
        let vocals_path = self
            .expected_vocals_path(input, output_root)
            .ok_or_else(|| IsolationError::InvalidInput(input.path().to_path_buf()))?;

        tokio::fs::create_dir_all(output_root)
            .await
            .map_err(|source| IsolationError::OutputDir {
                path: output_root.to_path_buf(),
                source,
            })?;

        debug!(
            input = %input,
            output_root = %output_root.display(),
            model = %self.model,
            "Separating vocals"
        );

        let mut cmd = tool_command(&self.program);
        cmd.arg("--two-stems=vocals")
            .arg("-n")
            .arg(&self.model)
            .arg("-o")
            .arg(output_root)
            .arg(input.path());

        let output = run_tool(cmd).await.map_err(|source| IsolationError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(IsolationError::ToolFailed {
                code: output.status.code(),
                stderr: stderr_tail(&output),
            });
        }

        if tokio::fs::try_exists(&vocals_path).await.unwrap_or(false) {
            info!(input = %input, vocals = %vocals_path.display(), "Vocals separated");
            Ok(Isolation::Vocals(WaveformFile::new(vocals_path)))
        } else {
            warn!(
                input = %input,
                expected = %vocals_path.display(),
                "Separator finished without a vocal stem"
            );
            Ok(Isolation::NoVocalFound)
        }
    }
}
