//! Deterministic exit codes for the slipway CLI.
//!
//! Scripts and CI pipelines branch on these, so they are part of the
//! tool's contract:
//!
//! - **0**: promoted successfully, nothing to report
//! - **1**: aborted before promotion — the previously-live slot is
//!   untouched and still serving
//! - **3**: the operation succeeded but reported warnings — a deploy
//!   whose post-promotion cleanup failed, or a prune that could not
//!   remove every eligible release; traffic is fine, the warnings need
//!   operator attention
//!
//! 2 is left to clap's usage errors.

/// Completed successfully.
pub const SUCCESS: u8 = 0;

/// Deploy aborted before promotion; current slot unaffected.
pub const ABORTED: u8 = 1;

/// Completed, but with warnings that need operator attention.
pub const COMPLETED_WITH_WARNINGS: u8 = 3;
