//! slipway-deploy — the release orchestrator.
//!
//! One invocation is one deployment attempt:
//!
//! ```text
//! Resolving → Staging → Starting → HealthChecking ─┬→ Promoting → Settling → Done
//!                                                  └→ RollingBack (attempt fails)
//! ```
//!
//! Failures before the health gate abort without touching the live
//! pointer or the previously-live slot — the host is left exactly as it
//! was, which *is* the rollback. A failed health gate force-stops the
//! target and leaves the old slot serving. After a successful cutover,
//! old-slot teardown and retention pruning are best-effort: their
//! failures are reported on the [`DeployReport`], never rolled back.
//!
//! At most one attempt may run at a time against an application; that is
//! the caller's responsibility, not enforced here.

pub mod deployer;
pub mod phase;

pub use deployer::{Deployer, protected_releases};
pub use phase::{DeployError, DeployPhase, DeployReport, DeployWarning};
