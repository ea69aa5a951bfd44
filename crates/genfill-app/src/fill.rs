//! The generative fill cycle.
//!
//! # Design
//! - Guards run before any side effect: reachability first, then the in-flight
//!   check, then the host selection probe.
//! - Everything from the export onward runs inside an [`ArtifactScope`] that is
//!   released whether the cycle succeeds or fails.
//! - Steps are strictly sequential; nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use genfill_client::{InpaintClient, InpaintRequest};
use genfill_host::{ArtifactSet, EditingHost, Offset};
use tracing::{Instrument, debug, info, info_span};

use crate::artifacts::ArtifactScope;
use crate::error::{FillError, FillResult};
use crate::status::StatusCell;

/// Result of a completed fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// Timestamp keying the cycle's artifacts.
    pub timestamp: i64,
    /// Document offset the result was placed at.
    pub offset: Offset,
}

/// Runs fill cycles against an editing host and the inference server.
pub struct FillOrchestrator {
    host: Arc<dyn EditingHost>,
    client: InpaintClient,
    status: StatusCell,
    artifact_root: PathBuf,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FillOrchestrator {
    /// Orchestrator writing artifacts under `artifact_root`.
    #[must_use]
    pub fn new(
        host: Arc<dyn EditingHost>,
        client: InpaintClient,
        status: StatusCell,
        artifact_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host,
            client,
            status,
            artifact_root: artifact_root.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Directory the artifacts are written to: the host's own root when it
    /// supplies one, the configured root otherwise.
    #[must_use]
    pub fn artifact_root(&self) -> &Path {
        self.host
            .artifact_root()
            .unwrap_or(self.artifact_root.as_path())
    }

    /// Run one fill cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FillError::ServerUnavailable`], [`FillError::Busy`] or
    /// [`FillError::NoSelection`] when a guard rejects the attempt, with no
    /// artifacts created. Later failures are returned after cleanup has run.
    pub async fn generative_fill(&self) -> FillResult<FillOutcome> {
        let status = self.status.current();
        if !status.is_reachable() {
            return Err(FillError::ServerUnavailable {
                reason: status.label(),
            });
        }
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(FillError::Busy)?;

        let has_selection = self
            .host
            .has_selection()
            .await
            .map_err(|err| FillError::host("selection.probe", err))?;
        if !has_selection {
            return Err(FillError::NoSelection);
        }

        let root = self.artifact_root();
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|source| FillError::ArtifactWrite {
                path: root.to_path_buf(),
                source,
            })?;

        let timestamp = Utc::now().timestamp_millis();
        let scope = ArtifactScope::new(
            Arc::clone(&self.host),
            ArtifactSet::new(root, timestamp),
        );
        let span = info_span!("generative_fill", timestamp);
        let result = self
            .run_cycle(scope.artifacts())
            .instrument(span.clone())
            .await;
        let failures = scope.release().instrument(span).await;

        match &result {
            Ok(outcome) => info!(
                timestamp,
                x = outcome.offset.x,
                y = outcome.offset.y,
                cleanup_failures = failures,
                "generative fill completed"
            ),
            Err(err) => info!(
                timestamp,
                error = %err,
                cleanup_failures = failures,
                "generative fill failed"
            ),
        }
        result
    }

    async fn run_cycle(&self, artifacts: &ArtifactSet) -> FillResult<FillOutcome> {
        let offset = self
            .host
            .export_selection(artifacts)
            .await
            .map_err(|err| FillError::host("selection.export", err))?;
        debug!(x = offset.x, y = offset.y, "selection exported");

        let image = read_artifact(artifacts.image_path()).await?;
        let mask = read_artifact(artifacts.mask_path()).await?;
        let request = InpaintRequest::from_png(&image, &mask);

        let result = self
            .client
            .inpaint(&request)
            .await
            .map_err(|source| FillError::Inference { source })?;
        debug!(bytes = result.len(), "inference result received");

        let result_png = artifacts.result_png();
        tokio::fs::write(&result_png, &result)
            .await
            .map_err(|source| FillError::ArtifactWrite {
                path: result_png,
                source,
            })?;

        self.host
            .place_result(artifacts)
            .await
            .map_err(|err| FillError::host("result.place", err))?;
        debug!("result placed");

        Ok(FillOutcome {
            timestamp: artifacts.timestamp(),
            offset,
        })
    }
}

async fn read_artifact(path: &Path) -> FillResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| FillError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })
}
