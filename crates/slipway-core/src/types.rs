//! Domain types shared across the Slipway crates.
//!
//! These types describe the two deployment slots, release identity, and
//! the metadata record shipped inside every release artifact.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ── Slot ──────────────────────────────────────────────────────────

/// One of the two fixed deployment slots.
///
/// A slot's identity, port, and working-directory alias never change;
/// only the release it points at does. At most one slot is live (named
/// by the live pointer) at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The other slot. Deployments always target `current.other()`.
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Directory name of this slot's alias under `<root>/slots/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Slot::A => "a",
            Slot::B => "b",
        }
    }

    /// Decode a slot from its alias directory name.
    pub fn from_dir_name(name: &str) -> Option<Slot> {
        match name {
            "a" => Some(Slot::A),
            "b" => Some(Slot::B),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// ── Release identity ──────────────────────────────────────────────

/// Unique, monotonically increasing release identifier.
///
/// The value is the packaging timestamp in unix seconds; the release's
/// directory in the store is its decimal rendering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReleaseId(u64);

impl ReleaseId {
    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Identifier for a release packaged right now.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReleaseId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(ReleaseId)
    }
}

// ── Release manifest ──────────────────────────────────────────────

/// How the artifact was packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Self-contained runtime bundle; runs as-is.
    Bundle,
    /// Source plus installed dependencies.
    Source,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Bundle => f.write_str("bundle"),
            BuildMode::Source => f.write_str("source"),
        }
    }
}

/// Metadata record at the root of every release artifact (`release.json`).
///
/// The orchestrator consumes only `timestamp` and `build_mode`; the
/// remaining fields are informational and surfaced by `slipway status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Packaging time in unix seconds; doubles as the release id.
    pub timestamp: u64,
    pub build_mode: BuildMode,
    #[serde(default)]
    pub runtime_version: Option<semver::Version>,
    #[serde(default)]
    pub package_manager: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
}

impl ReleaseManifest {
    /// The release identity derived from the packaging timestamp.
    pub fn release_id(&self) -> ReleaseId {
        ReleaseId::new(self.timestamp)
    }
}
