//! Audio acquisition adapter
//!
//! Downloads the best available audio for a URL and transcodes it to WAV
//! using `yt-dlp` (which drives ffmpeg for the transcode).
//!
//! # Output convention
//! The output template is `<dir>/%(id)s.%(ext)s` and `--print after_move:id`
//! echoes the resource id once post-processing is done, so the waveform is
//! always `<dir>/<id>.wav` and never needs a directory scan.
//!
//! # Requirements
//! - `yt-dlp` on PATH (or configured path)
//! - `ffmpeg` reachable by yt-dlp

use crate::models::WaveformFile;
use crate::utils::process::{last_stdout_line, run_tool, stderr_tail, tool_command};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Acquisition errors
///
/// All variants surface to callers as the same "download failed" outcome; the
/// detail is for operator logs.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Downloader could not be started (typically not installed)
    #[error("failed to launch downloader {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Downloader exited non-zero (network, unsupported site, region block, transcode)
    #[error("downloader exited with {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    /// Downloader did not report a usable resource id
    #[error("downloader reported no usable resource id (got {0:?})")]
    MissingId(Option<String>),

    /// Expected output absent or empty after a successful run
    #[error("expected waveform {0} is missing or empty")]
    MissingOutput(PathBuf),
}

/// Fetch a URL as a decoded waveform file inside `workdir`
///
/// The caller owns `workdir` and its lifetime.
#[async_trait]
pub trait AudioAcquirer: Send + Sync {
    async fn acquire(&self, url: &str, workdir: &Path) -> Result<WaveformFile, AcquisitionError>;
}

/// `yt-dlp` based acquirer
#[derive(Debug, Clone)]
pub struct YtDlpAcquirer {
    program: PathBuf,
    audio_quality: String,
}

impl YtDlpAcquirer {
    pub fn new(program: impl Into<PathBuf>, audio_quality: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            audio_quality: audio_quality.into(),
        }
    }

    fn output_template(workdir: &Path) -> PathBuf {
        workdir.join("%(id)s.%(ext)s")
    }
}

impl Default for YtDlpAcquirer {
    fn default() -> Self {
        Self::new("yt-dlp", "192K")
    }
}

/// Resource ids become file names; anything that could escape the directory is refused
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0')
}

#[async_trait]
impl AudioAcquirer for YtDlpAcquirer {
    async fn acquire(&self, url: &str, workdir: &Path) -> Result<WaveformFile, AcquisitionError> {
        debug!(url = %url, workdir = %workdir.display(), "Acquiring audio");

        let mut cmd = tool_command(&self.program);
        cmd.arg("--no-playlist")
            .arg("--no-progress")
            .args(["-f", "bestaudio/best"])
            .arg("-x")
            .args(["--audio-format", "wav"])
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("-o")
            .arg(Self::output_template(workdir))
            .args(["--print", "after_move:id"])
            // A URL starting with '-' must not be parsed as an option
            .arg("--")
            .arg(url);

        let output = run_tool(cmd).await.map_err(|source| AcquisitionError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(AcquisitionError::ToolFailed {
                code: output.status.code(),
                stderr: stderr_tail(&output),
            });
        }

        let id = last_stdout_line(&output);
        let id = match id {
            Some(id) if is_safe_id(&id) => id,
            other => return Err(AcquisitionError::MissingId(other)),
        };

        let path = workdir.join(format!("{}.wav", id));
        let non_empty = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            return Err(AcquisitionError::MissingOutput(path));
        }

        info!(url = %url, id = %id, file = %path.display(), "Audio acquired");
        Ok(WaveformFile::new(path))
    }
}
