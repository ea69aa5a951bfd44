//! Typed capability over the editing host.

use std::path::Path;

use async_trait::async_trait;

use crate::artifacts::ArtifactSet;
use crate::error::HostResult;
use crate::geometry::Offset;
use crate::launcher::LaunchSpec;

/// Operations the fill cycle needs from the editing host.
///
/// Implementations report host-side failures as errors; a normal return means
/// the host completed the operation.
#[async_trait]
pub trait EditingHost: Send + Sync {
    /// Directory the host wants fill artifacts written to, when it has one.
    /// Callers fall back to their configured root on `None`.
    fn artifact_root(&self) -> Option<&Path> {
        None
    }

    /// Whether the active document has a selection.
    async fn has_selection(&self) -> HostResult<bool>;

    /// Export the padded selection window, its mask and its offset record to
    /// the paths in `artifacts`, leaving the document unchanged. Returns the
    /// window's top-left offset.
    async fn export_selection(&self, artifacts: &ArtifactSet) -> HostResult<Offset>;

    /// Place the result image as a new top-level raster layer whose top-left
    /// corner sits on the recorded offset.
    async fn place_result(&self, artifacts: &ArtifactSet) -> HostResult<()>;

    /// Remove an artifact file; removing a missing file succeeds.
    async fn delete_artifact(&self, path: &Path) -> HostResult<()>;

    /// Launch the inference server in the background.
    async fn start_server(&self, launch: &LaunchSpec) -> HostResult<()>;
}
