use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IndexerError;

const LOCK_FILE: &str = ".cc-index.lock";

/// Root-scoped exclusive advisory lock for a build (§3 Ownership: "the
/// Indexer exclusively owns all on-disk artifacts during a build").
///
/// No crate in the stack models a bare create-new lock file — this is the
/// one place that reaches for the standard library directly rather than a
/// crate, since the whole mechanism is a single `create_new` syscall. The
/// lock file is removed on drop, so a clean exit always releases it; a
/// crash leaves it behind and a future run must treat a stale lock as a
/// recoverable condition, not a permanent one.
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    /// Acquire the lock, failing with `LockHeld` if another build is active.
    pub fn acquire(root: &Path) -> Result<Self, IndexerError> {
        let path = root.join(LOCK_FILE);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(IndexerError::LockHeld),
            Err(e) => Err(IndexerError::Io(e)),
        }
    }

    /// Forcibly remove a lock file left behind by a crashed build. Callers
    /// should only do this after confirming no process holds it (e.g. on
    /// startup, before the first build of a session).
    pub fn clear_stale(root: &Path) -> std::io::Result<()> {
        let path = root.join(LOCK_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_allows_reacquire() {
        let tmp = tempfile::TempDir::new().unwrap();
        {
            let _lock = BuildLock::acquire(tmp.path()).unwrap();
            assert!(BuildLock::acquire(tmp.path()).is_err());
        }
        assert!(BuildLock::acquire(tmp.path()).is_ok());
    }

    #[test]
    fn concurrent_acquire_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let _first = BuildLock::acquire(tmp.path()).unwrap();
        let second = BuildLock::acquire(tmp.path());
        assert!(matches!(second, Err(IndexerError::LockHeld)));
    }

    #[test]
    fn clear_stale_allows_recovery_after_crash() {
        let tmp = tempfile::TempDir::new().unwrap();
        let lock = BuildLock::acquire(tmp.path()).unwrap();
        std::mem::forget(lock); // simulate a crash: lock file left on disk

        assert!(BuildLock::acquire(tmp.path()).is_err());
        BuildLock::clear_stale(tmp.path()).unwrap();
        assert!(BuildLock::acquire(tmp.path()).is_ok());
    }
}
