//! Environment-driven configuration loading.
//!
//! Every variable is optional; unset or blank variables keep the default from
//! [`PanelConfig::default`]. Setting `GENFILL_DEVICE` pins the device and disables
//! persistence of the preference.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{Device, DeviceSetting, PanelConfig};

/// Inference server host.
pub const ENV_HOST: &str = "GENFILL_HOST";
/// Inference server port.
pub const ENV_PORT: &str = "GENFILL_PORT";
/// Model passed to the server launcher.
pub const ENV_MODEL: &str = "GENFILL_MODEL";
/// Status probe interval in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "GENFILL_POLL_INTERVAL_MS";
/// Selection padding in pixels.
pub const ENV_PADDING_PX: &str = "GENFILL_PADDING_PX";
/// Directory for fill artifacts.
pub const ENV_ARTIFACT_DIR: &str = "GENFILL_ARTIFACT_DIR";
/// Location of the client-local storage document.
pub const ENV_STORAGE_PATH: &str = "GENFILL_STORAGE_PATH";
/// Fixed device; disables persistence when set.
pub const ENV_DEVICE: &str = "GENFILL_DEVICE";

impl PanelConfig {
    /// Build configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a variable holds a value that
    /// cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a variable holds a value that
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(host) = read(ENV_HOST) {
            config.endpoint.host = host;
        }
        if let Some(port) = read(ENV_PORT) {
            config.endpoint.port = parse_port(&port)?;
        }
        if let Some(model) = read(ENV_MODEL) {
            config.model = model;
        }
        if let Some(interval) = read(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(parse_interval(&interval)?);
        }
        if let Some(padding) = read(ENV_PADDING_PX) {
            config.padding_px = padding.parse().map_err(|_| ConfigError::InvalidField {
                field: "padding_px",
                value: Some(padding.clone()),
                reason: "not_a_number",
            })?;
        }
        if let Some(dir) = read(ENV_ARTIFACT_DIR) {
            config.artifact_root = PathBuf::from(dir);
        }
        if let Some(device) = read(ENV_DEVICE) {
            config.device = DeviceSetting::Fixed(device.parse::<Device>()?);
        } else if let Some(path) = read(ENV_STORAGE_PATH) {
            config.device = DeviceSetting::Persisted {
                storage_path: PathBuf::from(path),
            };
        }
        Ok(config)
    }
}

fn parse_port(value: &str) -> ConfigResult<u16> {
    let port = value.parse::<u16>().map_err(|_| ConfigError::InvalidField {
        field: "port",
        value: Some(value.to_string()),
        reason: "not_a_port",
    })?;
    if port == 0 {
        return Err(ConfigError::InvalidField {
            field: "port",
            value: Some(value.to_string()),
            reason: "zero",
        });
    }
    Ok(port)
}

fn parse_interval(value: &str) -> ConfigResult<u64> {
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidField {
            field: "poll_interval_ms",
            value: Some(value.to_string()),
            reason: "zero",
        }),
        Ok(millis) => Ok(millis),
        Err(_) => Err(ConfigError::InvalidField {
            field: "poll_interval_ms",
            value: Some(value.to_string()),
            reason: "not_a_number",
        }),
    }
}
