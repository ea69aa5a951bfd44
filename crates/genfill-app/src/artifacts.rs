//! Scoped ownership of one cycle's artifacts.
//!
//! # Design
//! - `release` deletes all four paths through the host and must be awaited on
//!   every exit path of a cycle.
//! - Dropping an unreleased scope (task cancelled, panic) removes the files
//!   directly from the filesystem.

use std::io;
use std::sync::Arc;

use genfill_host::{ArtifactSet, EditingHost};
use tracing::{debug, warn};

/// Owns an [`ArtifactSet`] until its files are deleted.
pub struct ArtifactScope {
    host: Arc<dyn EditingHost>,
    artifacts: ArtifactSet,
    released: bool,
}

impl ArtifactScope {
    /// Take ownership of `artifacts`, deleting them through `host` on release.
    #[must_use]
    pub fn new(host: Arc<dyn EditingHost>, artifacts: ArtifactSet) -> Self {
        Self {
            host,
            artifacts,
            released: false,
        }
    }

    /// Paths owned by this scope.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Delete every artifact. Each path is attempted even if an earlier one
    /// fails; returns the number of failed deletions.
    #[must_use]
    pub async fn release(mut self) -> usize {
        let mut failures = 0;
        for path in self.artifacts.cleanup_paths() {
            if let Err(err) = self.host.delete_artifact(&path).await {
                failures += 1;
                warn!(error = %err, path = %path.display(), "failed to delete fill artifact");
            }
        }
        self.released = true;
        debug!(
            timestamp = self.artifacts.timestamp(),
            failures, "fill artifacts released"
        );
        failures
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in self.artifacts.cleanup_paths() {
            if let Err(err) = std::fs::remove_file(&path)
                && err.kind() != io::ErrorKind::NotFound
            {
                warn!(
                    error = %err,
                    path = %path.display(),
                    "failed to remove abandoned fill artifact"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use genfill_test_support::mocks::{HostStep, RecordingHost};
    use tempfile::TempDir;

    fn populate(artifacts: &ArtifactSet) -> Result<()> {
        for path in artifacts.cleanup_paths() {
            std::fs::write(path, b"x")?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn release_deletes_every_path_through_host() -> Result<()> {
        let temp = TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 11);
        populate(&artifacts)?;
        let host = Arc::new(RecordingHost::new());
        let scope = ArtifactScope::new(host.clone(), artifacts.clone());

        assert_eq!(scope.release().await, 0);
        assert_eq!(host.deleted(), artifacts.cleanup_paths().to_vec());
        assert!(artifacts.cleanup_paths().iter().all(|path| !path.exists()));
        Ok(())
    }

    #[tokio::test]
    async fn failed_deletions_do_not_stop_the_sweep() -> Result<()> {
        let temp = TempDir::new()?;
        let host = Arc::new(RecordingHost::new().failing(HostStep::Delete));
        let scope = ArtifactScope::new(host.clone(), ArtifactSet::new(temp.path(), 12));

        assert_eq!(scope.release().await, 4);
        assert_eq!(host.count(HostStep::Delete), 4);
        Ok(())
    }

    #[test]
    fn dropped_scope_removes_files_directly() -> Result<()> {
        let temp = TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 13);
        populate(&artifacts)?;
        let host = Arc::new(RecordingHost::new());

        drop(ArtifactScope::new(host.clone(), artifacts.clone()));

        assert!(artifacts.cleanup_paths().iter().all(|path| !path.exists()));
        assert!(host.calls().is_empty());
        Ok(())
    }
}
