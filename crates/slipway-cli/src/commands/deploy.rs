//! `slipway deploy` — run one deployment attempt.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use slipway_core::Config;
use slipway_deploy::Deployer;
use slipway_supervisor::SystemdSupervisor;
use slipway_switch::NginxController;

use crate::exit_codes;

pub async fn run(config_path: &Path, artifact: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let proxy = NginxController::new(
        config.proxy.upstream_conf.clone(),
        config.app.name.clone(),
        config.proxy.validate_cmd.clone(),
        config.proxy.reload_cmd.clone(),
    );
    let supervisor = SystemdSupervisor::new();
    let mut deployer = Deployer::new(config, supervisor, proxy)
        .context("opening release store")?;

    match deployer.run(artifact).await {
        Ok(report) => {
            println!(
                "promoted release {} to slot {} ({} health attempts); slot {} retired",
                report.release, report.promoted, report.health_attempts, report.retired
            );
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            if report.clean() {
                Ok(ExitCode::from(exit_codes::SUCCESS))
            } else {
                Ok(ExitCode::from(exit_codes::COMPLETED_WITH_WARNINGS))
            }
        }
        Err(err) => {
            eprintln!("deploy failed: {err}");
            eprintln!("the previously-live slot is unaffected and still serving");
            Ok(ExitCode::from(exit_codes::ABORTED))
        }
    }
}
