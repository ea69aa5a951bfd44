//! Recording editing host with injectable failures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use genfill_host::artifacts::{remove_if_exists, write_offset_record};
use genfill_host::{ArtifactSet, EditingHost, HostError, HostResult, LaunchSpec, Offset};
use image::Rgba;

use crate::fixtures::png_bytes;

/// Host operation, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStep {
    /// Selection probe.
    Probe,
    /// Selection export.
    Export,
    /// Result placement.
    Place,
    /// Artifact deletion.
    Delete,
    /// Server launch.
    StartServer,
}

/// A call observed by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// Selection probe.
    Probe,
    /// Export of the artifact set with the given timestamp.
    Export(i64),
    /// Placement of the artifact set with the given timestamp.
    Place(i64),
    /// Deletion of a path.
    Delete(PathBuf),
    /// Server launch.
    StartServer(LaunchSpec),
}

impl HostCall {
    /// Operation this call belongs to.
    #[must_use]
    pub const fn step(&self) -> HostStep {
        match self {
            Self::Probe => HostStep::Probe,
            Self::Export(_) => HostStep::Export,
            Self::Place(_) => HostStep::Place,
            Self::Delete(_) => HostStep::Delete,
            Self::StartServer(_) => HostStep::StartServer,
        }
    }
}

/// Editing host that records calls and produces real artifacts on export.
///
/// Export writes a tiny crop, a mask and the offset record so cleanup can be
/// observed on disk; deletion removes files for real.
#[derive(Debug)]
pub struct RecordingHost {
    selection: bool,
    offset: Offset,
    export_images: bool,
    artifact_root: Option<PathBuf>,
    failures: HashSet<HostStep>,
    calls: Mutex<Vec<HostCall>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    /// Host with an active selection and no injected failures.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selection: true,
            offset: Offset::new(0, 0),
            export_images: true,
            artifact_root: None,
            failures: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set whether the document reports a selection.
    #[must_use]
    pub const fn with_selection(mut self, selection: bool) -> Self {
        self.selection = selection;
        self
    }

    /// Offset written to the record on export.
    #[must_use]
    pub const fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    /// Export succeeds and writes the offset record, but leaves the image and
    /// mask files unwritten.
    #[must_use]
    pub const fn without_export_images(mut self) -> Self {
        self.export_images = false;
        self
    }

    /// Report `root` as the host's artifact directory.
    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = Some(root.into());
        self
    }

    /// Make every call of `step` fail with a host script error.
    #[must_use]
    pub fn failing(mut self, step: HostStep) -> Self {
        self.failures.insert(step);
        self
    }

    /// Calls observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().clone()
    }

    /// Number of calls of `step` observed so far.
    #[must_use]
    pub fn count(&self, step: HostStep) -> usize {
        self.lock().iter().filter(|call| call.step() == step).count()
    }

    /// Paths passed to deletion, in order.
    #[must_use]
    pub fn deleted(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                HostCall::Delete(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) -> HostResult<()> {
        let step = call.step();
        self.lock().push(call);
        if self.failures.contains(&step) {
            return Err(HostError::Script {
                function: format!("{step:?}"),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HostCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_png(path: &Path) -> HostResult<()> {
    let bytes = png_bytes(2, 2, Rgba([0, 0, 0, 255])).map_err(|err| HostError::Script {
        function: "fixture".to_string(),
        message: err.to_string(),
    })?;
    std::fs::write(path, bytes).map_err(|source| HostError::Io {
        operation: "fixture.write",
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl EditingHost for RecordingHost {
    fn artifact_root(&self) -> Option<&Path> {
        self.artifact_root.as_deref()
    }

    async fn has_selection(&self) -> HostResult<bool> {
        self.record(HostCall::Probe)?;
        Ok(self.selection)
    }

    async fn export_selection(&self, artifacts: &ArtifactSet) -> HostResult<Offset> {
        self.record(HostCall::Export(artifacts.timestamp()))?;
        write_offset_record(&artifacts.result_offset(), self.offset)?;
        if self.export_images {
            write_png(artifacts.mask_path())?;
            write_png(artifacts.image_path())?;
        }
        Ok(self.offset)
    }

    async fn place_result(&self, artifacts: &ArtifactSet) -> HostResult<()> {
        self.record(HostCall::Place(artifacts.timestamp()))
    }

    async fn delete_artifact(&self, path: &Path) -> HostResult<()> {
        self.record(HostCall::Delete(path.to_path_buf()))?;
        remove_if_exists(path).await
    }

    async fn start_server(&self, launch: &LaunchSpec) -> HostResult<()> {
        self.record(HostCall::StartServer(launch.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn export_materialises_artifacts_and_delete_removes_them() -> Result<()> {
        let temp = tempfile::TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 9);
        let host = RecordingHost::new().with_offset(Offset::new(3, 4));

        assert_eq!(host.export_selection(&artifacts).await?, Offset::new(3, 4));
        assert!(artifacts.image_path().exists());
        assert!(artifacts.mask_path().exists());
        assert_eq!(std::fs::read_to_string(artifacts.result_offset())?, "3,4");

        host.delete_artifact(artifacts.image_path()).await?;
        assert!(!artifacts.image_path().exists());
        assert_eq!(host.deleted(), vec![artifacts.image_path().to_path_buf()]);
        assert_eq!(host.count(HostStep::Export), 1);
        Ok(())
    }

    #[tokio::test]
    async fn export_can_skip_image_files() -> Result<()> {
        let temp = tempfile::TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 10);
        let host = RecordingHost::new()
            .without_export_images()
            .with_artifact_root(temp.path());

        host.export_selection(&artifacts).await?;
        assert!(artifacts.result_offset().exists());
        assert!(!artifacts.image_path().exists());
        assert!(!artifacts.mask_path().exists());
        assert_eq!(host.artifact_root(), Some(temp.path()));
        Ok(())
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_then_raised() -> Result<()> {
        let host = RecordingHost::new()
            .with_selection(false)
            .failing(HostStep::Place);
        assert!(!host.has_selection().await?);

        let temp = tempfile::TempDir::new()?;
        let result = host.place_result(&ArtifactSet::new(temp.path(), 1)).await;
        assert!(matches!(result, Err(HostError::Script { .. })));
        assert_eq!(host.calls(), vec![HostCall::Probe, HostCall::Place(1)]);
        Ok(())
    }
}
