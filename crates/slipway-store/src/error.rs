//! Error types for the release store.

use std::path::PathBuf;

use thiserror::Error;

use slipway_core::ReleaseId;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while staging or pruning releases.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to extract artifact: {0}")]
    Extract(String),

    #[error("release manifest missing or malformed: {0}")]
    Manifest(String),

    #[error("release {0} already exists in the store")]
    IdCollision(ReleaseId),

    #[error("release {0} not found in the store")]
    NotFound(ReleaseId),

    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
