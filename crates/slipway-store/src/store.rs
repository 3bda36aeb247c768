//! The release catalog — staging, listing, retention pruning.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flate2::read::GzDecoder;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use slipway_core::{ReleaseId, ReleaseManifest};

use crate::error::{StoreError, StoreResult};
use crate::release::{MANIFEST_FILE, Release};

/// Release directory names are the decimal unix-seconds id.
fn release_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{9,12}$").expect("release dir pattern"))
}

/// On-disk catalog of staged releases.
#[derive(Debug, Clone)]
pub struct ReleaseStore {
    releases_dir: PathBuf,
}

impl ReleaseStore {
    /// Open the store, creating the releases directory if needed.
    pub fn open(releases_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let releases_dir = releases_dir.into();
        std::fs::create_dir_all(&releases_dir).map_err(|source| StoreError::Io {
            path: releases_dir.clone(),
            source,
        })?;
        Ok(Self { releases_dir })
    }

    pub fn releases_dir(&self) -> &Path {
        &self.releases_dir
    }

    /// Directory a release occupies (whether or not it exists).
    pub fn release_dir(&self, id: ReleaseId) -> PathBuf {
        self.releases_dir.join(id.to_string())
    }

    /// Stage a packaged artifact into the catalog.
    ///
    /// Extracts the tar.gz into a scratch directory, reads the manifest,
    /// and renames into `releases/<id>`. A pre-existing directory for the
    /// same id is a collision and is never overwritten. On any failure
    /// the scratch directory is removed and the catalog is unchanged.
    pub fn stage(&self, artifact: &Path) -> StoreResult<Release> {
        let digest = sha256_file(artifact)?;
        let scratch = self
            .releases_dir
            .join(format!(".staging-{}", std::process::id()));
        if scratch.exists() {
            // Leftover from a crashed attempt; safe to clear.
            std::fs::remove_dir_all(&scratch).map_err(|source| StoreError::Io {
                path: scratch.clone(),
                source,
            })?;
        }

        let staged = self.extract_and_commit(artifact, &scratch);
        if staged.is_err() {
            let _ = std::fs::remove_dir_all(&scratch);
        }
        let (id, dir, manifest) = staged?;

        info!(
            release = %id,
            sha256 = %digest,
            build_mode = %manifest.build_mode,
            "release staged"
        );
        Ok(Release::new(id, dir, manifest, Some(digest)))
    }

    fn extract_and_commit(
        &self,
        artifact: &Path,
        scratch: &Path,
    ) -> StoreResult<(ReleaseId, PathBuf, ReleaseManifest)> {
        let file = File::open(artifact).map_err(|source| StoreError::ArtifactRead {
            path: artifact.to_path_buf(),
            source,
        })?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .unpack(scratch)
            .map_err(|e| StoreError::Extract(format!("{}: {e}", artifact.display())))?;

        let manifest_path = scratch.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| StoreError::Manifest(format!("{MANIFEST_FILE}: {e}")))?;
        let manifest: ReleaseManifest = serde_json::from_str(&content)
            .map_err(|e| StoreError::Manifest(format!("{MANIFEST_FILE}: {e}")))?;

        let id = manifest.release_id();
        let final_dir = self.release_dir(id);
        if final_dir.exists() {
            return Err(StoreError::IdCollision(id));
        }
        std::fs::rename(scratch, &final_dir).map_err(|source| StoreError::Io {
            path: final_dir.clone(),
            source,
        })?;
        Ok((id, final_dir, manifest))
    }

    /// All releases in the catalog, newest first.
    ///
    /// Directories that do not look like releases (scratch dirs, foreign
    /// files) are skipped; releases with an unreadable manifest are
    /// skipped with a warning rather than failing the listing.
    pub fn list(&self) -> StoreResult<Vec<Release>> {
        let entries = std::fs::read_dir(&self.releases_dir).map_err(|source| StoreError::Io {
            path: self.releases_dir.clone(),
            source,
        })?;

        let mut releases = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !release_dir_pattern().is_match(name) {
                debug!(entry = name, "skipping non-release entry");
                continue;
            }
            let Ok(id) = name.parse::<ReleaseId>() else {
                continue;
            };
            match Release::load(id, entry.path()) {
                Ok(release) => releases.push(release),
                Err(e) => warn!(release = %id, error = %e, "skipping unreadable release"),
            }
        }

        releases.sort_by(|a, b| b.id().cmp(&a.id()));
        Ok(releases)
    }

    /// Look up a single release by id.
    pub fn get(&self, id: ReleaseId) -> StoreResult<Release> {
        let dir = self.release_dir(id);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(id));
        }
        Release::load(id, dir)
    }

    /// Delete releases beyond the `keep` most recent.
    ///
    /// Releases in `protected` (those currently backing a slot) are never
    /// deleted regardless of age. Per-release deletion failures do not
    /// abort the sweep; they are collected on the report for the caller
    /// to surface.
    pub fn prune(&self, keep: usize, protected: &BTreeSet<ReleaseId>) -> StoreResult<PruneReport> {
        let releases = self.list()?;
        let mut report = PruneReport::default();

        for (index, release) in releases.iter().enumerate() {
            let id = release.id();
            if index < keep {
                report.kept.push(id);
                continue;
            }
            if protected.contains(&id) {
                debug!(release = %id, "retention: keeping slot-referenced release");
                report.kept.push(id);
                continue;
            }
            match std::fs::remove_dir_all(release.dir()) {
                Ok(()) => {
                    debug!(release = %id, "retention: removed");
                    report.removed.push(id);
                }
                Err(e) => {
                    warn!(release = %id, error = %e, "retention: failed to remove");
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        info!(
            removed = report.removed.len(),
            kept = report.kept.len(),
            failures = report.failures.len(),
            "retention sweep complete"
        );
        Ok(report)
    }
}

/// Outcome of one retention sweep.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub removed: Vec<ReleaseId>,
    pub kept: Vec<ReleaseId>,
    /// Releases that should have been removed but could not be, with the
    /// io error text. Non-fatal, surfaced by the caller.
    pub failures: Vec<(ReleaseId, String)>,
}

/// Compute the SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> StoreResult<String> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    })?;
    let hash = Sha256::digest(&bytes);
    Ok(hex::encode(hash))
}
