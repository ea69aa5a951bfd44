//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers shared by the host, client and app crates.
//! - Environment loading lives in `loader.rs`; persistence in `storage.rs`.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    ARTIFACT_DIR_NAME, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_PORT, POLL_INTERVAL_MS,
    SELECTION_PADDING_PX, STORAGE_FILE_NAME,
};
use crate::error::ConfigError;

/// Compute device the inference server runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Run inference on the CPU.
    #[default]
    Cpu,
    /// Run inference on a CUDA device.
    Cuda,
}

impl Device {
    #[must_use]
    /// Render the device as its lowercase string representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
        }
    }
}

impl FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            other => Err(ConfigError::InvalidField {
                field: "device",
                value: Some(other.to_string()),
                reason: "unknown_device",
            }),
        }
    }
}

impl Display for Device {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Address of the local inference server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerEndpoint {
    /// Base URL (`http://host:port`) for requests against the server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Source of the device preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSetting {
    /// Preference is read from and written to client-local storage.
    Persisted {
        /// Location of the storage document.
        storage_path: PathBuf,
    },
    /// Preference is fixed and changes are not persisted.
    Fixed(Device),
}

impl Default for DeviceSetting {
    fn default() -> Self {
        Self::Persisted {
            storage_path: default_storage_path(),
        }
    }
}

/// Complete panel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Inference server address.
    pub endpoint: ServerEndpoint,
    /// Model name passed to the server launcher.
    pub model: String,
    /// Delay between two status probes.
    pub poll_interval: Duration,
    /// Margin added around the selection before export.
    pub padding_px: u32,
    /// Directory holding per-cycle fill artifacts.
    pub artifact_root: PathBuf,
    /// Where the device preference comes from.
    pub device: DeviceSetting,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            endpoint: ServerEndpoint::default(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            padding_px: SELECTION_PADDING_PX,
            artifact_root: std::env::temp_dir().join(ARTIFACT_DIR_NAME),
            device: DeviceSetting::default(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(std::env::temp_dir, PathBuf::from)
        .join(".genfill")
        .join(STORAGE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parses_known_values() -> Result<(), ConfigError> {
        assert_eq!("cpu".parse::<Device>()?, Device::Cpu);
        assert_eq!(" cuda ".parse::<Device>()?, Device::Cuda);
        assert!(matches!(
            "metal".parse::<Device>(),
            Err(ConfigError::InvalidField {
                field: "device",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn defaults_match_local_server_layout() {
        let config = PanelConfig::default();
        assert_eq!(config.endpoint.base_url(), "http://localhost:7458");
        assert_eq!(config.model, "lama");
        assert_eq!(config.poll_interval, Duration::from_millis(2_000));
        assert_eq!(config.padding_px, 50);
        assert_eq!(Device::default(), Device::Cpu);
        assert!(matches!(config.device, DeviceSetting::Persisted { .. }));
    }
}
