//! # Design
//!
//! - Constant error messages; context travels in fields.
//! - Host-side script failures are surfaced as values instead of being swallowed
//!   at the host boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Failure raised by a script bridge transport.
#[derive(Debug, Error)]
#[error("script bridge failure")]
pub struct BridgeError {
    /// Transport-specific detail.
    pub detail: String,
}

impl BridgeError {
    /// Build a bridge error from any displayable detail.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Errors produced by editing host operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// The script bridge could not evaluate a call.
    #[error("host script bridge failed")]
    Bridge {
        /// Host function being invoked.
        function: String,
        /// Underlying bridge error.
        source: BridgeError,
    },
    /// The host evaluated the call and reported a failure.
    #[error("host script reported a failure")]
    Script {
        /// Host function that failed.
        function: String,
        /// Message returned by the host.
        message: String,
    },
    /// The host returned a value outside the call's contract.
    #[error("unexpected host script reply")]
    UnexpectedReply {
        /// Host function that replied.
        function: String,
        /// Raw reply text.
        reply: String,
    },
    /// The document has no active selection.
    #[error("document has no active selection")]
    NoSelection,
    /// An artifact the host should have produced does not exist.
    #[error("host artifact missing")]
    MissingArtifact {
        /// Expected artifact path.
        path: PathBuf,
    },
    /// The offset record did not hold two comma-separated integers.
    #[error("invalid offset record")]
    InvalidOffset {
        /// Offset record path.
        path: PathBuf,
        /// Record content.
        content: String,
    },
    /// A rectangle was malformed or empty.
    #[error("invalid rectangle")]
    InvalidRect {
        /// Rectangle as provided by the caller.
        value: String,
    },
    /// Filesystem operation failed.
    #[error("host io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Image decoding or encoding failed.
    #[error("host image failure")]
    Image {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying image error.
        source: image::ImageError,
    },
    /// Launching the inference server failed.
    #[error("failed to launch inference server")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A blocking host task did not complete.
    #[error("host task failed")]
    Task {
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn host_errors_keep_constant_messages() {
        let bridge = HostError::Bridge {
            function: "deleteFile".to_string(),
            source: BridgeError::new("pipe closed"),
        };
        assert_eq!(bridge.to_string(), "host script bridge failed");
        assert!(bridge.source().is_some());

        let script = HostError::Script {
            function: "placeImageAsRaster".to_string(),
            message: "no document".to_string(),
        };
        assert_eq!(script.to_string(), "host script reported a failure");
        assert!(script.source().is_none());

        assert_eq!(
            HostError::NoSelection.to_string(),
            "document has no active selection"
        );
    }
}
