//! systemd-backed supervisor.
//!
//! Slot processes run as transient units created with `systemd-run` and
//! torn down with `systemctl`. Unit names follow `<app>-<slot>`, so a
//! slot's process is addressable without tracking pids.

use tokio::process::Command;
use tracing::{debug, info};

use crate::{ProcessSpec, ProcessSupervisor, SupervisorError};

/// `systemctl` exit code for "unit not loaded" — stopping a unit that
/// does not exist, which slipway treats as success.
const EXIT_NOT_LOADED: i32 = 5;

/// Supervisor that shells out to systemd.
#[derive(Debug, Clone, Default)]
pub struct SystemdSupervisor;

impl SystemdSupervisor {
    pub fn new() -> Self {
        Self
    }
}

/// Build the `systemd-run` argument vector for a process spec.
fn run_unit_args(spec: &ProcessSpec) -> Vec<String> {
    let mut args = vec![
        "--collect".to_string(),
        format!("--unit={}", spec.unit),
        format!("--working-directory={}", spec.working_dir.display()),
        format!("--setenv=PORT={}", spec.port),
    ];
    if let Some(env_file) = &spec.env_file {
        args.push(format!("--property=EnvironmentFile={}", env_file.display()));
    }
    args.push("--".to_string());
    args.push(spec.working_dir.join(&spec.entrypoint).display().to_string());
    args.extend(spec.args.iter().cloned());
    args
}

impl ProcessSupervisor for SystemdSupervisor {
    async fn start(&self, spec: &ProcessSpec) -> Result<(), SupervisorError> {
        let args = run_unit_args(spec);
        debug!(unit = %spec.unit, ?args, "starting transient unit");
        let output = Command::new("systemd-run")
            .args(&args)
            .output()
            .await
            .map_err(|source| SupervisorError::Spawn {
                program: "systemd-run".to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(SupervisorError::StartFailed {
                unit: spec.unit.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!(unit = %spec.unit, port = spec.port, "unit started");
        Ok(())
    }

    async fn stop(&self, unit: &str) -> Result<(), SupervisorError> {
        systemctl(&["stop", unit], unit).await?;
        info!(unit, "unit stopped");
        Ok(())
    }

    async fn kill(&self, unit: &str) -> Result<(), SupervisorError> {
        // SIGKILL the unit's processes, then reap the unit itself.
        systemctl(&["kill", "--signal=SIGKILL", unit], unit).await?;
        systemctl(&["stop", unit], unit).await?;
        info!(unit, "unit killed");
        Ok(())
    }
}

async fn systemctl(args: &[&str], unit: &str) -> Result<(), SupervisorError> {
    let output = Command::new("systemctl")
        .args(args)
        .output()
        .await
        .map_err(|source| SupervisorError::Spawn {
            program: "systemctl".to_string(),
            source,
        })?;

    match output.status.code() {
        Some(0) | Some(EXIT_NOT_LOADED) => Ok(()),
        _ => Err(SupervisorError::StopFailed {
            unit: unit.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spec() -> ProcessSpec {
        ProcessSpec {
            unit: "myapp-b".to_string(),
            working_dir: PathBuf::from("/srv/myapp/slots/b"),
            entrypoint: "bin/server".to_string(),
            args: vec!["--quiet".to_string()],
            port: 3002,
            env_file: Some(PathBuf::from("/srv/myapp/shared/.env")),
        }
    }

    #[test]
    fn run_args_bind_slot_port_and_unit() {
        let args = run_unit_args(&spec());
        assert!(args.contains(&"--unit=myapp-b".to_string()));
        assert!(args.contains(&"--setenv=PORT=3002".to_string()));
        assert!(args.contains(&"--working-directory=/srv/myapp/slots/b".to_string()));
        assert!(args.contains(&"--property=EnvironmentFile=/srv/myapp/shared/.env".to_string()));
        // Entrypoint resolved against the slot alias, after `--`.
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[sep + 1], "/srv/myapp/slots/b/bin/server");
        assert_eq!(args[sep + 2], "--quiet");
    }

    #[test]
    fn run_args_omit_env_file_when_absent() {
        let mut spec = spec();
        spec.env_file = None;
        let args = run_unit_args(&spec);
        assert!(!args.iter().any(|a| a.contains("EnvironmentFile")));
    }
}
