//! Error types for logtint.

use std::path::PathBuf;

use thiserror::Error;

use logtint_types::ProjectionId;

/// Failures reported by a log surface while mutating its projection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("{0} is not mounted on this surface")]
    ProjectionDetached(ProjectionId),

    #[error("surface rejected update: {0}")]
    Rejected(String),
}

/// Failures inside a reconciliation pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Failures while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
