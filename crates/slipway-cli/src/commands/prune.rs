//! `slipway prune` — manual retention sweep.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use slipway_core::Config;
use slipway_deploy::protected_releases;
use slipway_store::ReleaseStore;

use crate::exit_codes;

pub fn run(config_path: &Path, keep_override: Option<usize>) -> anyhow::Result<ExitCode> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let store = ReleaseStore::open(config.releases_dir()).context("opening release store")?;

    let keep = keep_override.unwrap_or(config.deploy.keep_releases);
    let protected = protected_releases(&config);
    let report = store.prune(keep, &protected).context("pruning releases")?;

    println!(
        "removed {} release(s), kept {} (keep={keep}, {} slot-protected)",
        report.removed.len(),
        report.kept.len(),
        protected.len(),
    );
    for (id, detail) in &report.failures {
        eprintln!("warning: release {id} could not be removed: {detail}");
    }

    if report.failures.is_empty() {
        Ok(ExitCode::from(exit_codes::SUCCESS))
    } else {
        Ok(ExitCode::from(exit_codes::COMPLETED_WITH_WARNINGS))
    }
}
