//! `slipway releases` — list the release catalog.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use slipway_core::Config;
use slipway_store::{Release, ReleaseStore};

use crate::exit_codes;

pub fn run(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let store = ReleaseStore::open(config.releases_dir()).context("opening release store")?;

    let releases = store.list().context("listing releases")?;
    if releases.is_empty() {
        println!("no releases staged");
        return Ok(ExitCode::from(exit_codes::SUCCESS));
    }

    for release in &releases {
        println!("{}", render_release(release));
    }
    Ok(ExitCode::from(exit_codes::SUCCESS))
}

fn render_release(release: &Release) -> String {
    let manifest = release.manifest();
    format!(
        "{}  {:6}  {:>8}  {}",
        release.id(),
        release.build_mode().to_string(),
        format_size(release.size_bytes()),
        manifest.commit_hash.as_deref().unwrap_or("-"),
    )
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
