//! Deployment phases, errors, and the attempt report.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use slipway_core::{ReleaseId, Slot};
use slipway_store::StoreError;
use slipway_supervisor::SupervisorError;
use slipway_switch::SwitchError;

/// Current phase of a deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployPhase {
    /// Attempt not started.
    Pending,
    /// Reading the live pointer and assigning slots.
    Resolving,
    /// Extracting the artifact into the store and repointing the target
    /// slot alias.
    Staging,
    /// Starting the target slot's process.
    Starting,
    /// Waiting on the health gate.
    HealthChecking,
    /// Cutting traffic over to the target slot.
    Promoting,
    /// Health gate failed; force-stopping the target.
    RollingBack { reason: String },
    /// Draining the old slot before teardown.
    Settling,
    /// Retention pruning; attempt finished.
    Done,
}

/// Fatal errors — the attempt ends, traffic stays on the old slot.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("staging failed: {0}")]
    Staging(#[from] StoreError),

    #[error("failed to repoint slot {slot} alias: {source}")]
    SlotLink {
        slot: Slot,
        source: std::io::Error,
    },

    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("health gate timed out after {attempts} attempts")]
    HealthTimeout { attempts: u32 },

    #[error("traffic switch failed: {0}")]
    Switch(#[from] SwitchError),
}

/// Non-fatal problems after promotion. Traffic is already on the new
/// slot; these are surfaced, not rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployWarning {
    /// The old slot's process could not be stopped during settling.
    OldSlotStop { unit: String, detail: String },
    /// Retention pruning failed, wholly or for individual releases.
    Prune { detail: String },
}

impl fmt::Display for DeployWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployWarning::OldSlotStop { unit, detail } => {
                write!(f, "old slot unit {unit} was not stopped: {detail}")
            }
            DeployWarning::Prune { detail } => {
                write!(f, "retention pruning incomplete: {detail}")
            }
        }
    }
}

/// Outcome of a successful attempt.
#[derive(Debug)]
pub struct DeployReport {
    /// The release now serving traffic.
    pub release: ReleaseId,
    /// The slot that was promoted.
    pub promoted: Slot,
    /// The slot that was live before and is now idle.
    pub retired: Slot,
    /// Health gate attempts until the first success.
    pub health_attempts: u32,
    /// Non-fatal post-promotion problems.
    pub warnings: Vec<DeployWarning>,
}

impl DeployReport {
    /// Whether the attempt finished with no post-promotion warnings.
    pub fn clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_names_the_unit() {
        let warning = DeployWarning::OldSlotStop {
            unit: "myapp-a".to_string(),
            detail: "timeout".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("myapp-a"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn phase_serializes_with_rollback_reason() {
        let phase = DeployPhase::RollingBack {
            reason: "health gate timed out after 30 attempts".to_string(),
        };
        let json = serde_json::to_string(&phase).unwrap();
        let back: DeployPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(phase, back);
    }

    #[test]
    fn report_clean_reflects_warnings() {
        let mut report = DeployReport {
            release: ReleaseId::new(1_700_000_000),
            promoted: Slot::B,
            retired: Slot::A,
            health_attempts: 3,
            warnings: Vec::new(),
        };
        assert!(report.clean());
        report.warnings.push(DeployWarning::Prune {
            detail: "disk error".to_string(),
        });
        assert!(!report.clean());
    }
}
