//! Configuration resolution for vcd-detect
//!
//! **Priority:** command line → environment → TOML → compiled default
//!
//! clap folds command line and environment into [`CliOverrides`]; the TOML
//! file is loaded by `vcd_common::config::load_toml_config` into
//! [`DetectToml`]. [`Settings::resolve`] merges the two and validates the
//! result, so every startup configuration fault surfaces before the listener
//! binds.

use crate::extractors::N_MFCC;
use crate::services::PipelineSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use vcd_common::config::{load_toml_config, resolve_root_folder, LoggingConfig};
use vcd_common::{Error, Result};

/// Module name, used for the default config file name and health reports
pub const MODULE_NAME: &str = "vcd-detect";

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "VCD_ROOT_FOLDER";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub work_root: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
    pub classifier: Option<PathBuf>,
}

/// `vcd-detect.toml` contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectToml {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub detect: DetectSection,
}

/// `[detect]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectSection {
    pub work_root: Option<PathBuf>,
    /// Relative paths are taken from the root folder
    pub scaler_path: Option<PathBuf>,
    pub classifier_path: Option<PathBuf>,
    pub prefix_dimensions: usize,
    pub acquisition_timeout_secs: u64,
    pub isolation_timeout_secs: u64,
    pub ytdlp_path: String,
    pub audio_quality: String,
    pub demucs_path: String,
    pub demucs_model: String,
}

impl Default for DetectSection {
    fn default() -> Self {
        let pipeline = PipelineSettings::default();
        Self {
            work_root: None,
            scaler_path: None,
            classifier_path: None,
            prefix_dimensions: pipeline.prefix_dimensions,
            acquisition_timeout_secs: pipeline.acquisition_timeout.as_secs(),
            isolation_timeout_secs: pipeline.isolation_timeout.as_secs(),
            ytdlp_path: "yt-dlp".to_string(),
            audio_quality: "192K".to_string(),
            demucs_path: "demucs".to_string(),
            demucs_model: crate::services::vocal_isolator::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub scaler_path: PathBuf,
    pub classifier_path: PathBuf,
    pub pipeline: PipelineSettings,
    pub ytdlp_path: String,
    pub audio_quality: String,
    pub demucs_path: String,
    pub demucs_model: String,
}

impl Settings {
    /// Load `config_path` and resolve against it
    ///
    /// A missing file means compiled defaults. A file that exists but does
    /// not parse is a configuration fault: none of its values are used.
    pub fn load(cli: &CliOverrides, config_path: &Path) -> Result<Self> {
        let toml = load_toml_config::<DetectToml>(config_path)?;
        Self::resolve(cli, toml)
    }

    /// Merge command line/environment over TOML over defaults, then validate
    pub fn resolve(cli: &CliOverrides, toml: DetectToml) -> Result<Self> {
        let root_folder = resolve_root_folder(
            cli.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml.root_folder.as_deref(),
        );
        let detect = toml.detect;

        let models_dir = root_folder.join("models");
        let scaler_path = cli
            .scaler
            .clone()
            .or(detect.scaler_path)
            .map(|p| under_root(&root_folder, p))
            .unwrap_or_else(|| models_dir.join("scaler.json"));
        let classifier_path = cli
            .classifier
            .clone()
            .or(detect.classifier_path)
            .map(|p| under_root(&root_folder, p))
            .unwrap_or_else(|| models_dir.join("classifier.json"));

        let work_root = cli
            .work_root
            .clone()
            .or(detect.work_root)
            .unwrap_or_else(|| PipelineSettings::default().work_root);

        if detect.prefix_dimensions == 0 || detect.prefix_dimensions > N_MFCC {
            return Err(Error::Config(format!(
                "prefix_dimensions must be between 1 and {}, got {}",
                N_MFCC, detect.prefix_dimensions
            )));
        }
        if detect.acquisition_timeout_secs == 0 {
            return Err(Error::Config(
                "acquisition_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if detect.isolation_timeout_secs == 0 {
            return Err(Error::Config(
                "isolation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (key, value) in [
            ("ytdlp_path", &detect.ytdlp_path),
            ("demucs_path", &detect.demucs_path),
            ("demucs_model", &detect.demucs_model),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        let settings = Self {
            root_folder,
            host: cli
                .host
                .clone()
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            log_level: cli.log_level.clone().unwrap_or(toml.logging.level),
            scaler_path,
            classifier_path,
            pipeline: PipelineSettings {
                work_root,
                prefix_dimensions: detect.prefix_dimensions,
                acquisition_timeout: Duration::from_secs(detect.acquisition_timeout_secs),
                isolation_timeout: Duration::from_secs(detect.isolation_timeout_secs),
            },
            ytdlp_path: detect.ytdlp_path,
            audio_quality: detect.audio_quality,
            demucs_path: detect.demucs_path,
            demucs_model: detect.demucs_model,
        };

        info!(
            root_folder = %settings.root_folder.display(),
            work_root = %settings.pipeline.work_root.display(),
            prefix_dimensions = settings.pipeline.prefix_dimensions,
            "Configuration resolved"
        );
        Ok(settings)
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Feature width the model artifacts must accept
    pub fn feature_width(&self) -> usize {
        2 * self.pipeline.prefix_dimensions
    }
}

fn under_root(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
