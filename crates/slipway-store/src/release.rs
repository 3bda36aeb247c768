//! A single staged release.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use slipway_core::{BuildMode, ReleaseId, ReleaseManifest};

use crate::error::{StoreError, StoreResult};

/// Name of the metadata record at the root of every release.
pub(crate) const MANIFEST_FILE: &str = "release.json";

/// An immutable staged release in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    id: ReleaseId,
    dir: PathBuf,
    manifest: ReleaseManifest,
    /// Digest of the artifact this release was staged from; only known
    /// for releases staged in this process.
    artifact_sha256: Option<String>,
}

impl Release {
    pub(crate) fn new(
        id: ReleaseId,
        dir: PathBuf,
        manifest: ReleaseManifest,
        artifact_sha256: Option<String>,
    ) -> Self {
        Self {
            id,
            dir,
            manifest,
            artifact_sha256,
        }
    }

    /// Load a release from its directory by reading the manifest.
    pub(crate) fn load(id: ReleaseId, dir: PathBuf) -> StoreResult<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| StoreError::Manifest(format!("{}: {e}", manifest_path.display())))?;
        let manifest: ReleaseManifest = serde_json::from_str(&content)
            .map_err(|e| StoreError::Manifest(format!("{}: {e}", manifest_path.display())))?;
        Ok(Self::new(id, dir, manifest, None))
    }

    pub fn id(&self) -> ReleaseId {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &ReleaseManifest {
        &self.manifest
    }

    pub fn build_mode(&self) -> BuildMode {
        self.manifest.build_mode
    }

    pub fn artifact_sha256(&self) -> Option<&str> {
        self.artifact_sha256.as_deref()
    }

    /// Total size of the staged directory in bytes.
    pub fn size_bytes(&self) -> u64 {
        WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.metadata().ok())
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
            .sum()
    }
}
