//! Reachability of the inference server, shared between the poller, the
//! orchestrator guard and the view.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use genfill_client::ProbeOutcome;
use tokio::sync::watch;

/// Last known state of the inference server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerStatus {
    /// No probe has completed yet.
    #[default]
    Checking,
    /// The last probe returned a 2xx status.
    Connected,
    /// The last probe returned a non-success status.
    HttpError {
        /// HTTP status code.
        status: u16,
    },
    /// The last probe got no response.
    Unreachable,
}

impl ServerStatus {
    /// Status implied by a probe outcome.
    #[must_use]
    pub const fn from_probe(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Reachable => Self::Connected,
            ProbeOutcome::HttpError { status } => Self::HttpError { status: *status },
            ProbeOutcome::Unreachable { .. } => Self::Unreachable,
        }
    }

    /// Whether a fill may start.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Human-readable status label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Checking => "checking server".to_string(),
            Self::Connected => "server connected".to_string(),
            Self::HttpError { status } => format!("connection error ({status})"),
            Self::Unreachable => "server unreachable".to_string(),
        }
    }
}

impl Display for ServerStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.label())
    }
}

/// Shared latest-value cell holding the [`ServerStatus`].
///
/// Only the poller writes it; everything else reads or subscribes.
#[derive(Debug, Clone)]
pub struct StatusCell {
    tx: Arc<watch::Sender<ServerStatus>>,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCell {
    /// Cell starting in [`ServerStatus::Checking`].
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerStatus::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current status.
    #[must_use]
    pub fn current(&self) -> ServerStatus {
        self.tx.borrow().clone()
    }

    /// Whether the current status allows a fill.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.tx.borrow().is_reachable()
    }

    /// Receiver observing every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.tx.subscribe()
    }

    /// Store `status`, notifying subscribers only when it differs. Returns
    /// whether it changed.
    pub(crate) fn publish(&self, status: ServerStatus) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        })
    }
}
