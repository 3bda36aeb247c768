//! slipway.toml configuration parser.
//!
//! All operator knobs live in one file with documented defaults. The raw
//! toml structs are optional-heavy so that validation can inspect the
//! whole document and report every problem at once instead of failing on
//! the first missing field.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::types::Slot;

/// Errors raised while loading or validating `slipway.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },
}

// ── Raw (as-written) document ─────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    app: Option<RawApp>,
    slots: Option<RawSlots>,
    health: Option<RawHealth>,
    proxy: Option<RawProxy>,
    deploy: Option<RawDeploy>,
}

#[derive(Debug, Default, Deserialize)]
struct RawApp {
    name: Option<String>,
    root: Option<PathBuf>,
    entrypoint: Option<String>,
    args: Option<Vec<String>>,
    env_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSlots {
    port_a: Option<u16>,
    port_b: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHealth {
    path: Option<String>,
    expect_status: Option<u16>,
    timeout_secs: Option<u32>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProxy {
    upstream_conf: Option<PathBuf>,
    validate_cmd: Option<String>,
    reload_cmd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDeploy {
    grace_secs: Option<u64>,
    keep_releases: Option<usize>,
}

// ── Validated configuration ───────────────────────────────────────

/// Application identity and on-disk layout.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Short name; supervisor units are `<name>-<slot>`.
    pub name: String,
    /// Absolute root holding `releases/`, `slots/`, and `current`.
    pub root: PathBuf,
    /// Entrypoint relative to the release directory.
    pub entrypoint: String,
    pub args: Vec<String>,
    /// Environment file handed to the supervisor, resolved against `root`
    /// when relative.
    pub env_file: Option<PathBuf>,
}

/// The two fixed slot ports.
#[derive(Debug, Clone)]
pub struct SlotsConfig {
    pub port_a: u16,
    pub port_b: u16,
}

/// Health gate parameters.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// HTTP path to probe. Default `/healthz`.
    pub path: String,
    /// Exact status code counted as success. Default 200.
    pub expect_status: u16,
    /// Probe attempts before the gate gives up. Default 30.
    pub timeout_secs: u32,
    /// Interval between attempts. Default 1000ms.
    pub interval_ms: u64,
}

/// Reverse-proxy reconfiguration hooks.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Generated upstream snippet, included by the site config.
    pub upstream_conf: PathBuf,
    /// Command that must succeed before the new snippet is kept.
    pub validate_cmd: String,
    /// Command that applies the snippet to the running proxy.
    pub reload_cmd: String,
}

/// Orchestration knobs.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Drain window before the old slot's process is stopped. Default 10s.
    pub grace_secs: u64,
    /// Releases kept by retention pruning. Default 5.
    pub keep_releases: usize,
}

/// Fully validated Slipway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub slots: SlotsConfig,
    pub health: HealthConfig,
    pub proxy: ProxyConfig,
    pub deploy: DeployConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        validate(raw)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        validate(raw)
    }

    /// The fixed port a slot's process listens on.
    pub fn port_for(&self, slot: Slot) -> u16 {
        match slot {
            Slot::A => self.slots.port_a,
            Slot::B => self.slots.port_b,
        }
    }

    /// Supervisor unit name for a slot: `<app>-<slot>`.
    pub fn unit_name(&self, slot: Slot) -> String {
        format!("{}-{}", self.app.name, slot)
    }

    pub fn releases_dir(&self) -> PathBuf {
        self.app.root.join("releases")
    }

    pub fn slots_dir(&self) -> PathBuf {
        self.app.root.join("slots")
    }

    /// The slot's working-directory alias (`<root>/slots/<slot>`).
    pub fn slot_link(&self, slot: Slot) -> PathBuf {
        self.slots_dir().join(slot.dir_name())
    }

    /// The live pointer (`<root>/current`).
    pub fn current_link(&self) -> PathBuf {
        self.app.root.join("current")
    }

    /// Static-asset root the proxy serves cache-control headers from.
    /// Derived from the live pointer, so it is stable across cutovers.
    pub fn static_root(&self) -> PathBuf {
        self.current_link().join("public")
    }

    /// Environment file resolved against the application root.
    pub fn env_file_path(&self) -> Option<PathBuf> {
        self.app.env_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.app.root.join(p)
            }
        })
    }
}

/// Validate the raw document, collecting every problem before failing.
fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let mut problems = Vec::new();

    let app = raw.app.unwrap_or_default();
    let name = app.name.unwrap_or_default();
    if name.is_empty() {
        problems.push("app.name is required".to_string());
    } else if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        problems.push(format!("app.name `{name}` must contain only [a-z0-9-]"));
    }

    let root = app.root.unwrap_or_default();
    if root.as_os_str().is_empty() {
        problems.push("app.root is required".to_string());
    } else if !root.is_absolute() {
        problems.push(format!("app.root `{}` must be absolute", root.display()));
    }

    let entrypoint = app.entrypoint.unwrap_or_default();
    if entrypoint.is_empty() {
        problems.push("app.entrypoint is required".to_string());
    }

    let slots = raw.slots.unwrap_or_default();
    let port_a = slots.port_a.unwrap_or(0);
    let port_b = slots.port_b.unwrap_or(0);
    if port_a == 0 {
        problems.push("slots.port_a is required and must be non-zero".to_string());
    }
    if port_b == 0 {
        problems.push("slots.port_b is required and must be non-zero".to_string());
    }
    if port_a != 0 && port_a == port_b {
        problems.push("slots.port_a and slots.port_b must differ".to_string());
    }

    let health = raw.health.unwrap_or_default();
    let health_path = health.path.unwrap_or_else(|| "/healthz".to_string());
    if !health_path.starts_with('/') {
        problems.push(format!("health.path `{health_path}` must start with '/'"));
    }
    let timeout_secs = health.timeout_secs.unwrap_or(30);
    if timeout_secs == 0 {
        problems.push("health.timeout_secs must be >= 1".to_string());
    }
    let interval_ms = health.interval_ms.unwrap_or(1000);
    if interval_ms < 10 {
        problems.push("health.interval_ms must be >= 10".to_string());
    }

    let proxy = raw.proxy.unwrap_or_default();
    let upstream_conf = proxy.upstream_conf.unwrap_or_default();
    if upstream_conf.as_os_str().is_empty() {
        problems.push("proxy.upstream_conf is required".to_string());
    } else if !upstream_conf.is_absolute() {
        problems.push(format!(
            "proxy.upstream_conf `{}` must be absolute",
            upstream_conf.display()
        ));
    }
    let validate_cmd = proxy.validate_cmd.unwrap_or_else(|| "nginx -t".to_string());
    if validate_cmd.trim().is_empty() {
        problems.push("proxy.validate_cmd must not be empty".to_string());
    }
    let reload_cmd = proxy
        .reload_cmd
        .unwrap_or_else(|| "nginx -s reload".to_string());
    if reload_cmd.trim().is_empty() {
        problems.push("proxy.reload_cmd must not be empty".to_string());
    }

    let deploy = raw.deploy.unwrap_or_default();
    let keep_releases = deploy.keep_releases.unwrap_or(5);
    if keep_releases == 0 {
        problems.push("deploy.keep_releases must be >= 1".to_string());
    }

    if !problems.is_empty() {
        return Err(ConfigError::Invalid { problems });
    }

    Ok(Config {
        app: AppConfig {
            name,
            root,
            entrypoint,
            args: app.args.unwrap_or_default(),
            env_file: app.env_file,
        },
        slots: SlotsConfig { port_a, port_b },
        health: HealthConfig {
            path: health_path,
            expect_status: health.expect_status.unwrap_or(200),
            timeout_secs,
            interval_ms,
        },
        proxy: ProxyConfig {
            upstream_conf,
            validate_cmd,
            reload_cmd,
        },
        deploy: DeployConfig {
            grace_secs: deploy.grace_secs.unwrap_or(10),
            keep_releases,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[app]
name = "myapp"
root = "/srv/myapp"
entrypoint = "bin/server"

[slots]
port_a = 3001
port_b = 3002

[proxy]
upstream_conf = "/etc/nginx/conf.d/myapp-upstream.conf"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.health.path, "/healthz");
        assert_eq!(config.health.expect_status, 200);
        assert_eq!(config.health.timeout_secs, 30);
        assert_eq!(config.health.interval_ms, 1000);
        assert_eq!(config.proxy.validate_cmd, "nginx -t");
        assert_eq!(config.proxy.reload_cmd, "nginx -s reload");
        assert_eq!(config.deploy.grace_secs, 10);
        assert_eq!(config.deploy.keep_releases, 5);
    }

    #[test]
    fn layout_helpers() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.releases_dir(), PathBuf::from("/srv/myapp/releases"));
        assert_eq!(config.slot_link(Slot::A), PathBuf::from("/srv/myapp/slots/a"));
        assert_eq!(config.slot_link(Slot::B), PathBuf::from("/srv/myapp/slots/b"));
        assert_eq!(config.current_link(), PathBuf::from("/srv/myapp/current"));
        assert_eq!(config.static_root(), PathBuf::from("/srv/myapp/current/public"));
        assert_eq!(config.port_for(Slot::A), 3001);
        assert_eq!(config.port_for(Slot::B), 3002);
        assert_eq!(config.unit_name(Slot::B), "myapp-b");
    }

    #[test]
    fn env_file_resolves_against_root() {
        let toml = MINIMAL.replace(
            "entrypoint = \"bin/server\"",
            "entrypoint = \"bin/server\"\nenv_file = \"shared/.env\"",
        );
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(
            config.env_file_path(),
            Some(PathBuf::from("/srv/myapp/shared/.env"))
        );

        let toml = MINIMAL.replace(
            "entrypoint = \"bin/server\"",
            "entrypoint = \"bin/server\"\nenv_file = \"/etc/myapp/.env\"",
        );
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.env_file_path(), Some(PathBuf::from("/etc/myapp/.env")));
    }

    #[test]
    fn validation_aggregates_all_problems() {
        let err = Config::from_toml_str("[app]\nname = \"Bad Name\"\n").unwrap_err();
        let ConfigError::Invalid { problems } = err else {
            panic!("expected Invalid, got {err}");
        };
        // Bad name, missing root, missing entrypoint, both ports, upstream_conf.
        assert!(problems.len() >= 5, "expected aggregated problems: {problems:?}");
        assert!(problems.iter().any(|p| p.contains("app.name")));
        assert!(problems.iter().any(|p| p.contains("app.root")));
        assert!(problems.iter().any(|p| p.contains("port_a")));
        assert!(problems.iter().any(|p| p.contains("upstream_conf")));
    }

    #[test]
    fn equal_ports_rejected() {
        let toml = MINIMAL.replace("port_b = 3002", "port_b = 3001");
        let err = Config::from_toml_str(&toml).unwrap_err();
        let ConfigError::Invalid { problems } = err else {
            panic!("expected Invalid");
        };
        assert!(problems.iter().any(|p| p.contains("must differ")));
    }

    #[test]
    fn relative_root_rejected() {
        let toml = MINIMAL.replace("/srv/myapp", "srv/myapp");
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn health_path_must_start_with_slash() {
        let toml = format!("{MINIMAL}\n[health]\npath = \"healthz\"\n");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("health.path"));
    }

    #[test]
    fn zero_keep_releases_rejected() {
        let toml = format!("{MINIMAL}\n[deploy]\nkeep_releases = 0\n");
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slipway.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.app.name, "myapp");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::from_file(Path::new("/nonexistent/slipway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
