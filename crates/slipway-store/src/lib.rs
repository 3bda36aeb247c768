//! slipway-store — the on-disk release catalog.
//!
//! Releases live under `<root>/releases/<id>/`, one immutable directory
//! per staged artifact, named by the packaging timestamp. Staging
//! extracts into a scratch directory and renames into place, so a
//! half-extracted artifact never appears in the catalog. Retention
//! pruning deletes beyond the configured window but never a release a
//! slot still points at.

pub mod error;
pub mod release;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use release::Release;
pub use store::{PruneReport, ReleaseStore};
