//! Error types for pointer and proxy mutation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while switching traffic.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("failed to write proxy config {path}: {source}")]
    ProxyRender {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("proxy config validation failed: {0}")]
    ProxyValidate(String),

    #[error("proxy reload failed: {0}")]
    ProxyReload(String),

    #[error("failed to update live pointer {path}: {source}")]
    Pointer {
        path: PathBuf,
        source: std::io::Error,
    },
}
