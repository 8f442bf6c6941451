//! Configuration for the `ingest` binary.
//!
//! Settings come from an optional RON file (`ingest.ron` by default) and are
//! then overridden by command-line flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use ingest_core::SubmissionPolicy;
use ingest_engine::PipelineSettings;
use ingest_logging::{LogDestination, LogSettings};
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILENAME: &str = "ingest.ron";

#[derive(Debug, Parser)]
#[command(name = "ingest", version, about = "Track simulated file ingestion in the terminal")]
pub struct Cli {
    /// Files to submit at startup.
    pub files: Vec<PathBuf>,
    /// RON configuration file (defaults to ./ingest.ron when present).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Milliseconds between transfer progress updates.
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// Milliseconds the simulated analysis takes.
    #[arg(long)]
    pub analysis_ms: Option<u64>,
    /// Maximum number of files processed at once.
    #[arg(long)]
    pub max_concurrent: Option<usize>,
    /// Accept files of any type and size.
    #[arg(long)]
    pub any_type: bool,
    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
    /// Print a JSON snapshot of the final state on exit.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// On-disk shape; every field is optional. Durations are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tick_ms: Option<u64>,
    pub progress_step: Option<u8>,
    pub analysis_ms: Option<u64>,
    pub analysis_timeout_ms: Option<u64>,
    pub max_concurrent: Option<usize>,
    pub allowed_extensions: Option<Vec<String>>,
    pub max_size_bytes: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub pipeline: PipelineSettings,
    pub policy: SubmissionPolicy,
    pub log: LogSettings,
    pub json: bool,
}

/// Reads `path`; a missing file is an error only when `required`.
pub fn load_file_config(path: &Path, required: bool) -> Result<FileConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(FileConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => load_file_config(path, true)?,
            None => load_file_config(Path::new(DEFAULT_CONFIG_FILENAME), false)?,
        };
        Ok(Self::resolve(file, cli))
    }

    pub fn resolve(file: FileConfig, cli: &Cli) -> Self {
        let defaults = PipelineSettings::default();
        let pipeline = PipelineSettings {
            tick_interval: cli
                .tick_ms
                .or(file.tick_ms)
                .map_or(defaults.tick_interval, Duration::from_millis),
            progress_step: file.progress_step.unwrap_or(defaults.progress_step),
            analysis_delay: cli
                .analysis_ms
                .or(file.analysis_ms)
                .map_or(defaults.analysis_delay, Duration::from_millis),
            analysis_timeout: file.analysis_timeout_ms.map(Duration::from_millis),
            max_concurrent: cli.max_concurrent.or(file.max_concurrent),
        };

        let policy = if cli.any_type {
            SubmissionPolicy::permissive()
        } else {
            let defaults = SubmissionPolicy::default();
            SubmissionPolicy {
                allowed_extensions: file
                    .allowed_extensions
                    .unwrap_or(defaults.allowed_extensions),
                max_size_bytes: file.max_size_bytes.or(defaults.max_size_bytes),
            }
        };

        let destination = match cli.log_file.clone().or(file.log_file) {
            Some(path) => LogDestination::Both(path),
            None => LogDestination::Terminal,
        };
        let log = LogSettings {
            destination,
            level: if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        };

        Self {
            pipeline,
            policy,
            log,
            json: cli.json,
        }
    }
}
