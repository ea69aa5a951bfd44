//! Shared error type and per-invocation context for the CLI.

use std::fmt::{self, Display, Formatter};

use genfill_client::InpaintClient;
use genfill_config::{Device, DevicePreferences, PanelConfig};
use genfill_host::LaunchSpec;

use crate::output::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Resolved configuration passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) config: PanelConfig,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    pub(crate) fn preferences(&self) -> DevicePreferences {
        DevicePreferences::from_setting(&self.config.device)
    }

    pub(crate) fn device(&self) -> CliResult<Device> {
        self.preferences()
            .load()
            .map_err(|err| {
                CliError::failure(anyhow::Error::new(err).context("failed to read device preference"))
            })
    }

    pub(crate) fn launch_spec(&self) -> CliResult<LaunchSpec> {
        Ok(LaunchSpec {
            model: self.config.model.clone(),
            device: self.device()?,
            port: self.config.endpoint.port,
        })
    }

    pub(crate) fn inpaint_client(&self) -> CliResult<InpaintClient> {
        InpaintClient::new(&self.config.endpoint, self.config.poll_interval)
            .map_err(|err| {
                CliError::failure(anyhow::Error::new(err).context("failed to build HTTP client"))
            })
    }
}
