//! The live pointer and slot resolution.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use slipway_core::Slot;

use crate::error::SwitchError;

/// Replace `link` with a symlink to `target`, atomically with respect to
/// readers: the new link is created under a scratch name and renamed
/// over the old one, so observers see either the previous target or the
/// new one, never a missing link.
pub fn atomic_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    let scratch = scratch_name(link);
    if scratch.exists() || scratch.is_symlink() {
        std::fs::remove_file(&scratch)?;
    }
    std::os::unix::fs::symlink(target, &scratch)?;
    std::fs::rename(&scratch, link)
}

fn scratch_name(link: &Path) -> PathBuf {
    let mut name = link.file_name().unwrap_or_default().to_os_string();
    name.push(".next");
    link.with_file_name(name)
}

/// The single mutable indirection naming the live slot.
///
/// Read once per deployment attempt, never cached across attempts, and
/// mutated only by the traffic switch after a successful health gate.
#[derive(Debug, Clone)]
pub struct LivePointer {
    path: PathBuf,
}

impl LivePointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The slot the pointer currently names.
    ///
    /// `None` for an absent pointer (first-ever deployment) or one whose
    /// target does not decode to a slot alias. A dangling link still
    /// resolves: only the target's name matters.
    pub fn read(&self) -> Option<Slot> {
        let target = std::fs::read_link(&self.path).ok()?;
        let name = target.file_name()?.to_str()?;
        Slot::from_dir_name(name)
    }

    /// The raw link target, if any.
    pub fn read_target(&self) -> Option<PathBuf> {
        std::fs::read_link(&self.path).ok()
    }

    /// Point the live pointer at a slot's alias directory.
    pub fn commit(&self, slot_link: &Path) -> Result<(), SwitchError> {
        atomic_symlink(slot_link, &self.path).map_err(|source| SwitchError::Pointer {
            path: self.path.clone(),
            source,
        })?;
        info!(pointer = %self.path.display(), target = %slot_link.display(), "live pointer updated");
        Ok(())
    }
}

/// One attempt's slot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The slot serving production traffic (assumed `A` when no pointer
    /// exists yet).
    pub current: Slot,
    /// The slot this deployment will stage into.
    pub target: Slot,
}

/// Decide which slot is live and which is the deployment target.
///
/// An absent or malformed pointer defaults to `current = A`, which makes
/// the first-ever deployment well-defined without special-casing; the
/// pointer is simply overwritten on the first successful cutover.
pub fn resolve(pointer: &LivePointer) -> Resolution {
    let current = match pointer.read() {
        Some(slot) => slot,
        None => {
            debug!(pointer = %pointer.path().display(), "no live pointer, assuming slot a");
            Slot::A
        }
    };
    Resolution {
        current,
        target: current.other(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_pointer_defaults_to_a() {
        let dir = tempfile::tempdir().unwrap();
        let pointer = LivePointer::new(dir.path().join("current"));
        assert_eq!(pointer.read(), None);

        let res = resolve(&pointer);
        assert_eq!(res.current, Slot::A);
        assert_eq!(res.target, Slot::B);
    }

    #[test]
    fn pointer_to_b_targets_a() {
        let dir = tempfile::tempdir().unwrap();
        let slot_b = dir.path().join("slots/b");
        std::fs::create_dir_all(&slot_b).unwrap();
        let pointer = LivePointer::new(dir.path().join("current"));
        pointer.commit(&slot_b).unwrap();

        let res = resolve(&pointer);
        assert_eq!(res.current, Slot::B);
        assert_eq!(res.target, Slot::A);
    }

    #[test]
    fn dangling_pointer_still_resolves_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let pointer = LivePointer::new(dir.path().join("current"));
        // Target does not exist — resolution only reads the link itself.
        pointer.commit(&dir.path().join("slots/b")).unwrap();

        assert_eq!(pointer.read(), Some(Slot::B));
        assert_eq!(resolve(&pointer).current, Slot::B);
    }

    #[test]
    fn malformed_pointer_defaults_to_a() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = dir.path().join("somewhere-else");
        std::fs::create_dir_all(&elsewhere).unwrap();
        let pointer = LivePointer::new(dir.path().join("current"));
        pointer.commit(&elsewhere).unwrap();

        assert_eq!(pointer.read(), None);
        assert_eq!(resolve(&pointer).current, Slot::A);
    }

    #[test]
    fn commit_replaces_existing_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let slot_a = dir.path().join("slots/a");
        let slot_b = dir.path().join("slots/b");
        std::fs::create_dir_all(&slot_a).unwrap();
        std::fs::create_dir_all(&slot_b).unwrap();

        let pointer = LivePointer::new(dir.path().join("current"));
        pointer.commit(&slot_a).unwrap();
        assert_eq!(pointer.read(), Some(Slot::A));

        pointer.commit(&slot_b).unwrap();
        assert_eq!(pointer.read(), Some(Slot::B));
        assert_eq!(pointer.read_target(), Some(slot_b));
        // No scratch link left behind.
        assert!(!dir.path().join("current.next").is_symlink());
    }

    #[test]
    fn alternation_across_successive_resolutions() {
        let dir = tempfile::tempdir().unwrap();
        let pointer = LivePointer::new(dir.path().join("current"));
        let slots = dir.path().join("slots");
        std::fs::create_dir_all(&slots).unwrap();

        // Simulate three successful deployments; each promotes the
        // previous target.
        let mut promoted = Vec::new();
        for _ in 0..3 {
            let res = resolve(&pointer);
            pointer.commit(&slots.join(res.target.dir_name())).unwrap();
            promoted.push(res.target);
        }
        assert_eq!(promoted, vec![Slot::B, Slot::A, Slot::B]);
    }
}
