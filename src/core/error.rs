// src/core/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures launching or waiting on an external tool.
///
/// A tool that runs and exits non-zero is not an error: its output is still
/// captured and written to the report.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{0}` was not found on this system")]
    NotFound(String),
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed while waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum HostsError {
    #[error("permission denied writing {0}, re-run with elevated privileges")]
    PermissionDenied(PathBuf),
    #[error("refusing to write hosts entry: {0}")]
    InvalidEntry(String),
    #[error("failed to update {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {0} does not exist")]
    NotFound(PathBuf),
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that stop a run before any tool is launched.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: &'static str },
    #[error(transparent)]
    Report(#[from] ReportError),
}
