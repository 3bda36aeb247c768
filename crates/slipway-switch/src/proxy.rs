//! Reverse-proxy backend reconfiguration.
//!
//! The generated snippet defines a single-server upstream pointing at
//! the active slot's port, plus a variable carrying the live static
//! asset root for cache-control headers. The snippet is validated before
//! it is kept; a rejected config restores the previous snippet so the
//! running proxy and the file on disk never disagree.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::SwitchError;

/// Applies a backend port to the reverse proxy.
pub trait ProxyController {
    fn apply(
        &self,
        port: u16,
        static_root: &Path,
    ) -> impl Future<Output = Result<(), SwitchError>> + Send;
}

/// Drives nginx through a generated upstream snippet plus the operator's
/// validate and reload commands.
#[derive(Debug, Clone)]
pub struct NginxController {
    upstream_conf: PathBuf,
    upstream_name: String,
    validate_cmd: String,
    reload_cmd: String,
}

impl NginxController {
    pub fn new(
        upstream_conf: impl Into<PathBuf>,
        upstream_name: impl Into<String>,
        validate_cmd: impl Into<String>,
        reload_cmd: impl Into<String>,
    ) -> Self {
        Self {
            upstream_conf: upstream_conf.into(),
            upstream_name: upstream_name.into(),
            validate_cmd: validate_cmd.into(),
            reload_cmd: reload_cmd.into(),
        }
    }

    fn render(&self, port: u16, static_root: &Path) -> String {
        format!(
            "# Generated by slipway. Do not edit: rewritten on every cutover.\n\
             upstream {name}_backend {{\n    server 127.0.0.1:{port};\n}}\n\n\
             map $host ${name}_static_root {{\n    default \"{root}\";\n}}\n",
            name = self.upstream_name,
            root = static_root.display(),
        )
    }

    async fn restore(&self, previous: Option<String>) {
        let result = match previous {
            Some(content) => tokio::fs::write(&self.upstream_conf, content).await,
            None => match tokio::fs::remove_file(&self.upstream_conf).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!(
                path = %self.upstream_conf.display(),
                error = %e,
                "failed to restore previous proxy config"
            );
        }
    }
}

impl ProxyController for NginxController {
    async fn apply(&self, port: u16, static_root: &Path) -> Result<(), SwitchError> {
        let rendered = self.render(port, static_root);
        let previous = tokio::fs::read_to_string(&self.upstream_conf).await.ok();

        tokio::fs::write(&self.upstream_conf, &rendered)
            .await
            .map_err(|source| SwitchError::ProxyRender {
                path: self.upstream_conf.clone(),
                source,
            })?;
        debug!(path = %self.upstream_conf.display(), port, "proxy config rendered");

        if let Err(detail) = run_check(&self.validate_cmd).await {
            self.restore(previous).await;
            return Err(SwitchError::ProxyValidate(detail));
        }
        if let Err(detail) = run_check(&self.reload_cmd).await {
            self.restore(previous).await;
            return Err(SwitchError::ProxyReload(detail));
        }

        info!(port, "proxy backend switched");
        Ok(())
    }
}

/// Run a whitespace-split command line; non-zero exit is an error with
/// the trimmed stderr as detail.
async fn run_check(cmdline: &str) -> Result<(), String> {
    let mut parts = cmdline.split_whitespace();
    let Some(program) = parts.next() else {
        return Err("empty command".to_string());
    };
    let output = Command::new(program)
        .args(parts)
        .output()
        .await
        .map_err(|e| format!("failed to run `{program}`: {e}"))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "`{cmdline}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}
