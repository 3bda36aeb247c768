//! `slipway status` — what is live right now.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use slipway_core::{Config, ReleaseId, Slot};
use slipway_switch::LivePointer;

use crate::exit_codes;

pub fn run(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let pointer = LivePointer::new(config.current_link());
    let live = pointer.read();
    println!("{}", render_status(&config, live));
    Ok(ExitCode::from(exit_codes::SUCCESS))
}

/// Release id a slot's alias currently points at, if any.
fn slot_release(config: &Config, slot: Slot) -> Option<ReleaseId> {
    let target = std::fs::read_link(config.slot_link(slot)).ok()?;
    target.file_name()?.to_str()?.parse().ok()
}

fn render_status(config: &Config, live: Option<Slot>) -> String {
    let mut out = String::new();
    out.push_str(&format!("app:     {}\n", config.app.name));
    out.push_str(&format!(
        "live:    {}\n",
        live.map(|s| s.to_string())
            .unwrap_or_else(|| "none (never deployed)".to_string())
    ));
    for slot in [Slot::A, Slot::B] {
        let marker = if live == Some(slot) { "*" } else { " " };
        let release = slot_release(config, slot)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "slot {slot}{marker}: port {}  release {release}\n",
            config.port_for(slot)
        ));
    }
    out.push_str(&format!("pointer: {}", config.current_link().display()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &Path) -> Config {
        Config::from_toml_str(&format!(
            r#"
[app]
name = "myapp"
root = "{}"
entrypoint = "bin/server"

[slots]
port_a = 3001
port_b = 3002

[proxy]
upstream_conf = "/etc/nginx/conf.d/myapp.conf"
"#,
            root.display()
        ))
        .unwrap()
    }

    #[test]
    fn status_before_first_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let text = render_status(&config, None);
        assert!(text.contains("never deployed"));
        assert!(text.contains("port 3001"));
        assert!(text.contains("release -"));
    }

    #[test]
    fn status_marks_live_slot_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.slots_dir()).unwrap();
        let release = config.releases_dir().join("1700000123");
        std::fs::create_dir_all(&release).unwrap();
        slipway_switch::atomic_symlink(&release, &config.slot_link(Slot::B)).unwrap();

        let text = render_status(&config, Some(Slot::B));
        assert!(text.contains("live:    b"));
        assert!(text.contains("slot b*"));
        assert!(text.contains("release 1700000123"));
        assert!(text.contains("slot a :"));
    }
}
