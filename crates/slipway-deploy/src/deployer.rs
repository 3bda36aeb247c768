//! The deployer — drives one attempt through the phase machine.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use slipway_core::{Config, ReleaseId, Slot};
use slipway_health::{GateOutcome, HealthGate};
use slipway_store::{ReleaseStore, StoreError};
use slipway_supervisor::{ProcessSpec, ProcessSupervisor};
use slipway_switch::{LivePointer, ProxyController, TrafficSwitch, atomic_symlink, resolve};

use crate::phase::{DeployError, DeployPhase, DeployReport, DeployWarning};

/// Releases currently backing either slot; these are never pruned.
pub fn protected_releases(config: &Config) -> BTreeSet<ReleaseId> {
    let mut protected = BTreeSet::new();
    for slot in [Slot::A, Slot::B] {
        let link = config.slot_link(slot);
        let Ok(target) = std::fs::read_link(&link) else {
            continue;
        };
        let Some(name) = target.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Ok(id) = name.parse::<ReleaseId>() {
            protected.insert(id);
        }
    }
    protected
}

/// Orchestrates one blue-green deployment attempt.
pub struct Deployer<S, P> {
    config: Config,
    store: ReleaseStore,
    supervisor: S,
    proxy: P,
    phase: DeployPhase,
}

impl<S: ProcessSupervisor, P: ProxyController> Deployer<S, P> {
    /// Create a deployer, opening (and if needed creating) the store.
    pub fn new(config: Config, supervisor: S, proxy: P) -> Result<Self, StoreError> {
        let store = ReleaseStore::open(config.releases_dir())?;
        Ok(Self {
            config,
            store,
            supervisor,
            proxy,
            phase: DeployPhase::Pending,
        })
    }

    /// The phase the last `run` reached.
    pub fn phase(&self) -> &DeployPhase {
        &self.phase
    }

    pub fn store(&self) -> &ReleaseStore {
        &self.store
    }

    /// Run one deployment attempt for the given artifact.
    ///
    /// On `Err` the live pointer and the previously-live slot are exactly
    /// as they were before the attempt (the health-timeout path has
    /// additionally force-stopped the target process).
    pub async fn run(&mut self, artifact: &Path) -> Result<DeployReport, DeployError> {
        // ── Resolving ──────────────────────────────────────────────
        self.phase = DeployPhase::Resolving;
        let pointer = LivePointer::new(self.config.current_link());
        let resolution = resolve(&pointer);
        let (current, target) = (resolution.current, resolution.target);
        let target_port = self.config.port_for(target);
        info!(
            current = %current,
            target = %target,
            target_port,
            "slots resolved"
        );

        // ── Staging ────────────────────────────────────────────────
        self.phase = DeployPhase::Staging;
        let release = self.store.stage(artifact)?;
        let slot_link = self.config.slot_link(target);
        std::fs::create_dir_all(self.config.slots_dir()).map_err(|source| {
            DeployError::SlotLink {
                slot: target,
                source,
            }
        })?;
        atomic_symlink(release.dir(), &slot_link).map_err(|source| DeployError::SlotLink {
            slot: target,
            source,
        })?;
        info!(release = %release.id(), slot = %target, "target slot repointed");

        // ── Starting ───────────────────────────────────────────────
        self.phase = DeployPhase::Starting;
        let unit = self.config.unit_name(target);
        // An interrupted earlier attempt may have left a process bound to
        // the target port; stop is idempotent, so reconcile first.
        self.supervisor.stop(&unit).await?;
        let spec = ProcessSpec {
            unit: unit.clone(),
            working_dir: slot_link.clone(),
            entrypoint: self.config.app.entrypoint.clone(),
            args: self.config.app.args.clone(),
            port: target_port,
            env_file: self.config.env_file_path(),
        };
        self.supervisor.start(&spec).await?;

        // ── HealthChecking ─────────────────────────────────────────
        self.phase = DeployPhase::HealthChecking;
        let gate = HealthGate::from_config(&self.config.health);
        let health_attempts = match gate.wait(target_port).await {
            GateOutcome::Healthy { attempts } => attempts,
            GateOutcome::TimedOut { attempts } => {
                let reason = format!("health gate timed out after {attempts} attempts");
                self.phase = DeployPhase::RollingBack {
                    reason: reason.clone(),
                };
                warn!(slot = %target, %reason, "rolling back");
                // The unhealthy target must not keep the slot port bound.
                if let Err(e) = self.supervisor.kill(&unit).await {
                    warn!(unit = %unit, error = %e, "failed to stop unhealthy target");
                }
                return Err(DeployError::HealthTimeout { attempts });
            }
        };

        // ── Promoting ──────────────────────────────────────────────
        self.phase = DeployPhase::Promoting;
        let switch = TrafficSwitch::new(&self.proxy, &pointer);
        // On proxy failure the target process is intentionally left
        // running; the next attempt's Starting phase reconciles it.
        switch
            .cutover(
                target,
                target_port,
                &slot_link,
                &self.config.static_root(),
            )
            .await?;

        // ── Settling ───────────────────────────────────────────────
        self.phase = DeployPhase::Settling;
        let mut warnings = Vec::new();
        let grace = Duration::from_secs(self.config.deploy.grace_secs);
        info!(slot = %current, grace_secs = grace.as_secs(), "draining old slot");
        tokio::time::sleep(grace).await;
        let old_unit = self.config.unit_name(current);
        if let Err(e) = self.supervisor.stop(&old_unit).await {
            warn!(unit = %old_unit, error = %e, "old slot teardown failed");
            warnings.push(DeployWarning::OldSlotStop {
                unit: old_unit,
                detail: e.to_string(),
            });
        }

        // ── Done — retention ───────────────────────────────────────
        self.phase = DeployPhase::Done;
        let protected = protected_releases(&self.config);
        match self
            .store
            .prune(self.config.deploy.keep_releases, &protected)
        {
            Ok(report) => {
                for (id, detail) in report.failures {
                    warnings.push(DeployWarning::Prune {
                        detail: format!("release {id}: {detail}"),
                    });
                }
            }
            Err(e) => warnings.push(DeployWarning::Prune {
                detail: e.to_string(),
            }),
        }

        info!(
            release = %release.id(),
            promoted = %target,
            attempts = health_attempts,
            warnings = warnings.len(),
            "deployment complete"
        );
        Ok(DeployReport {
            release: release.id(),
            promoted: target,
            retired: current,
            health_attempts,
            warnings,
        })
    }
}
