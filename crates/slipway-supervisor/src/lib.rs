//! slipway-supervisor — starting and stopping slot processes.
//!
//! The orchestrator treats process supervision as an opaque capability
//! behind [`ProcessSupervisor`]: start a named long-running process bound
//! to a working directory and a port, stop it gracefully, or kill it
//! immediately. Exactly one process is active per slot, under the unit
//! name `<app>-<slot>`. The listening port is always the slot's fixed
//! port, injected as `PORT`, regardless of what the release would prefer.

use std::path::PathBuf;

use thiserror::Error;

pub mod systemd;

pub use systemd::SystemdSupervisor;

/// Errors from the supervisor boundary.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to invoke `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("unit {unit} failed to start: {detail}")]
    StartFailed { unit: String, detail: String },

    #[error("failed to stop unit {unit}: {detail}")]
    StopFailed { unit: String, detail: String },
}

/// Descriptor for one slot process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Unit name, `<app>-<slot>`.
    pub unit: String,
    /// The slot's working-directory alias.
    pub working_dir: PathBuf,
    /// Entrypoint relative to the working directory.
    pub entrypoint: String,
    pub args: Vec<String>,
    /// The slot's fixed port, injected as `PORT`.
    pub port: u16,
    pub env_file: Option<PathBuf>,
}

/// Start/stop contract the orchestrator drives.
///
/// `stop` and `kill` are idempotent: acting on an absent unit succeeds,
/// so teardown of a slot that never ran (first deployment) or was
/// already reaped is not an error.
pub trait ProcessSupervisor {
    fn start(&self, spec: &ProcessSpec) -> impl Future<Output = Result<(), SupervisorError>> + Send;

    /// Graceful stop.
    fn stop(&self, unit: &str) -> impl Future<Output = Result<(), SupervisorError>> + Send;

    /// Immediate forced termination (failed-health-check path).
    fn kill(&self, unit: &str) -> impl Future<Output = Result<(), SupervisorError>> + Send;
}
