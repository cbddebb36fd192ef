//! vcd-detect - AI vocal detection microservice
//!
//! Serves `POST /api/classify`: downloads the audio behind a URL, isolates
//! the vocal stem, and classifies the pair as AI-generated or human.
//!
//! Startup fails fast on any configuration fault (unusable model artifacts,
//! feature width disagreement, invalid pipeline settings).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcd_common::config::{default_config_path, load_toml_config};
use vcd_detect::config::{CliOverrides, DetectToml, Settings, MODULE_NAME};
use vcd_detect::extractors::MfccExtractor;
use vcd_detect::services::{
    ClassificationPipeline, ClassifierService, DemucsIsolator, YtDlpAcquirer,
};
use vcd_detect::AppState;

/// Command-line arguments for vcd-detect
#[derive(Parser, Debug)]
#[command(name = "vcd-detect")]
#[command(about = "AI vocal detection microservice")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "VCD_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding model artifacts (also VCD_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "VCD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "VCD_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VCD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Parent directory for per-request working storage
    #[arg(long, env = "VCD_WORK_ROOT")]
    work_root: Option<PathBuf>,

    /// Fitted scaler artifact (JSON)
    #[arg(long, env = "VCD_SCALER")]
    scaler: Option<PathBuf>,

    /// Fitted classifier artifact (JSON)
    #[arg(long, env = "VCD_CLASSIFIER")]
    classifier: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root_folder: self.root_folder.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            work_root: self.work_root.clone(),
            scaler: self.scaler.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(MODULE_NAME));

    // Only the log level is taken from this early read; load errors are
    // reported once the subscriber exists
    let level = args
        .log_level
        .clone()
        .or_else(|| {
            load_toml_config::<DetectToml>(&config_path)
                .ok()
                .map(|t| t.logging.level)
        })
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vcd_detect={0},vcd_common={0},tower_http={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", MODULE_NAME, env!("CARGO_PKG_VERSION"));
    info!("Build: {} ({}, {})", env!("GIT_HASH"), env!("BUILD_TIMESTAMP"), env!("BUILD_PROFILE"));
    info!("Config file: {}", config_path.display());

    let settings = Settings::load(&args.overrides(), &config_path)
        .context("Invalid configuration")?;

    // Model artifacts are loaded once and shared read-only by every request
    let classifier = ClassifierService::load(
        &settings.scaler_path,
        &settings.classifier_path,
        settings.feature_width(),
    )
    .context("Failed to load model artifacts")?;

    let pipeline = ClassificationPipeline::new(
        Arc::new(YtDlpAcquirer::new(
            settings.ytdlp_path.clone(),
            settings.audio_quality.clone(),
        )),
        Arc::new(DemucsIsolator::new(
            settings.demucs_path.clone(),
            settings.demucs_model.clone(),
        )),
        Arc::new(MfccExtractor::new()),
        Arc::new(classifier),
        settings.pipeline.clone(),
    )
    .context("Invalid pipeline configuration")?;
    info!("Pipeline ready (work root: {})", settings.pipeline.work_root.display());

    let state = AppState::new(Arc::new(pipeline));
    let app = vcd_detect::build_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
