//! # Design
//!
//! - Constant error messages; context travels in fields.
//! - `user_message` renders the alert shown in the panel for each failure.

use std::io;
use std::path::PathBuf;

use genfill_client::{API_INPAINT, ClientError};
use genfill_config::ConfigError;
use genfill_host::HostError;
use thiserror::Error;

/// Result alias for a fill cycle.
pub type FillResult<T> = Result<T, FillError>;

/// Result alias for panel operations outside the fill cycle.
pub type PanelResult<T> = Result<T, PanelError>;

/// Failures of one generative fill cycle.
#[derive(Debug, Error)]
pub enum FillError {
    /// The last liveness probe did not reach the server.
    #[error("inference server unavailable")]
    ServerUnavailable {
        /// Status label at the time of the attempt.
        reason: String,
    },
    /// The document has no active selection.
    #[error("no active selection")]
    NoSelection,
    /// Another fill cycle is still running.
    #[error("fill already in progress")]
    Busy,
    /// A host call failed.
    #[error("host operation failed")]
    Host {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying host error.
        source: HostError,
    },
    /// An exported artifact could not be read.
    #[error("artifact read failed")]
    ArtifactRead {
        /// Artifact path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An artifact could not be written.
    #[error("artifact write failed")]
    ArtifactWrite {
        /// Artifact path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The inference call failed.
    #[error("inference request failed")]
    Inference {
        /// Underlying client error.
        source: ClientError,
    },
}

impl FillError {
    pub(crate) const fn host(operation: &'static str, source: HostError) -> Self {
        Self::Host { operation, source }
    }

    /// Alert text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerUnavailable { .. } => {
                "Server unavailable. Start the server before using generative fill.".to_string()
            }
            Self::NoSelection => "No selection area".to_string(),
            Self::Busy => "A generative fill is already running".to_string(),
            Self::Host { source, .. } => format!("Host error: {}", host_detail(source)),
            Self::ArtifactRead { path, source } => {
                format!("File read error: {} ({source})", path.display())
            }
            Self::ArtifactWrite { path, source } => {
                format!("File write error: {} ({source})", path.display())
            }
            Self::Inference { source } => {
                let endpoint = source.endpoint().unwrap_or(API_INPAINT);
                format!("IOPaint API error - {endpoint}: {}", client_detail(source))
            }
        }
    }
}

fn host_detail(error: &HostError) -> String {
    match error {
        HostError::Script { message, .. } => message.clone(),
        HostError::Bridge { source, .. } => source.detail.clone(),
        HostError::MissingArtifact { path } => format!("missing {}", path.display()),
        HostError::InvalidOffset { path, content } => {
            format!("{error}: {} ({content:?})", path.display())
        }
        HostError::Io { path, source, .. } => format!("{error}: {} ({source})", path.display()),
        HostError::Image { path, source, .. } => {
            format!("{error}: {} ({source})", path.display())
        }
        HostError::Launch { program, source } => format!("{error}: {program} ({source})"),
        HostError::Task { source } => format!("{error} ({source})"),
        HostError::UnexpectedReply { function, reply } => {
            format!("{error} from {function}: {reply:?}")
        }
        HostError::NoSelection | HostError::InvalidRect { .. } => error.to_string(),
    }
}

fn config_detail(error: &ConfigError) -> String {
    match error {
        ConfigError::InvalidField {
            field,
            value,
            reason,
        } => format!(
            "{error}: {field}={} ({reason})",
            value.as_deref().unwrap_or_default()
        ),
        ConfigError::Io { path, source, .. } => format!("{error}: {} ({source})", path.display()),
        ConfigError::Json { path, source, .. } => {
            format!("{error}: {} ({source})", path.display())
        }
    }
}

fn client_detail(error: &ClientError) -> String {
    match error {
        ClientError::Status { status, .. } => format!("status {status}"),
        ClientError::Transport { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Failures of panel operations outside the fill cycle.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Reading or writing the persisted preference failed.
    #[error("panel configuration failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying configuration error.
        source: ConfigError,
    },
    /// A host call failed.
    #[error("panel host operation failed")]
    Host {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying host error.
        source: HostError,
    },
    /// The inference client could not be constructed.
    #[error("panel client setup failed")]
    Client {
        /// Underlying client error.
        source: ClientError,
    },
}

impl PanelError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn host(operation: &'static str, source: HostError) -> Self {
        Self::Host { operation, source }
    }

    /// Alert text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Host {
                operation: "server.start",
                source,
            } => format!("Error starting server: {}", host_detail(source)),
            Self::Host { source, .. } => format!("Host error: {}", host_detail(source)),
            Self::Config { source, .. } => format!("Settings error: {}", config_detail(source)),
            Self::Client { source } => format!("Client error: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn guard_failures_render_fixed_alerts() {
        let unavailable = FillError::ServerUnavailable {
            reason: "server unreachable".to_string(),
        };
        assert_eq!(unavailable.to_string(), "inference server unavailable");
        assert!(unavailable.user_message().starts_with("Server unavailable"));
        assert_eq!(FillError::NoSelection.user_message(), "No selection area");
    }

    #[test]
    fn inference_alert_names_endpoint() {
        let err = FillError::Inference {
            source: ClientError::Status {
                endpoint: "http://localhost:7458/api/v1/inpaint".to_string(),
                status: 502,
            },
        };
        assert_eq!(
            err.user_message(),
            "IOPaint API error - http://localhost:7458/api/v1/inpaint: status 502"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn host_alerts_surface_script_messages() {
        let err = FillError::host(
            "result.place",
            HostError::Script {
                function: "placeImageAsRaster".to_string(),
                message: "Could not complete the Place command".to_string(),
            },
        );
        assert_eq!(
            err.user_message(),
            "Host error: Could not complete the Place command"
        );

        let start = PanelError::host(
            "server.start",
            HostError::Script {
                function: "startServer".to_string(),
                message: "app.system failed".to_string(),
            },
        );
        assert_eq!(start.user_message(), "Error starting server: app.system failed");
    }

    #[test]
    fn io_and_image_alerts_name_path_and_cause() {
        let export = FillError::host(
            "selection.export",
            HostError::Io {
                operation: "offset.write",
                path: PathBuf::from("/tmp/genfill/result_7.txt"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
        );
        assert_eq!(
            export.user_message(),
            "Host error: host io failure: /tmp/genfill/result_7.txt (denied)"
        );

        let image = HostError::Image {
            operation: "document.open",
            path: PathBuf::from("in.png"),
            source: image::ImageError::IoError(io::Error::new(io::ErrorKind::NotFound, "gone")),
        };
        let message = FillError::host("result.place", image).user_message();
        assert!(message.starts_with("Host error: host image failure: in.png ("));
        assert!(message.contains("gone"));

        let launch = PanelError::host(
            "server.start",
            HostError::Launch {
                program: "iopaint".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            },
        );
        assert_eq!(
            launch.user_message(),
            "Error starting server: failed to launch inference server: iopaint (not found)"
        );
    }

    #[test]
    fn settings_alerts_name_storage_path() {
        let err = PanelError::config(
            "device.store",
            ConfigError::Io {
                operation: "storage.write",
                path: PathBuf::from("/home/u/.genfill/storage.json"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            },
        );
        assert_eq!(
            err.user_message(),
            "Settings error: configuration storage io failure: /home/u/.genfill/storage.json (read-only)"
        );
    }
}
