//! Client-local key/value storage and the persisted device preference.
//!
//! # Design
//! - One JSON object document; every key maps to a string value.
//! - Writes land in a sibling staging file that is renamed over the document.
//! - A missing document reads as empty, so first launch needs no setup.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{Device, DeviceSetting};

/// Storage key holding the device preference.
pub const DEVICE_KEY: &str = "device";

/// File-backed string key/value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a store backed by the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the document exists but cannot be read or parsed.
    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    /// Store `value` under `key`, keeping every other entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be read, serialized or written.
    pub fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn read_entries(&self) -> ConfigResult<BTreeMap<String, String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "storage.read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
            operation: "storage.parse",
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                operation: "storage.create_dir",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_vec_pretty(entries).map_err(|source| ConfigError::Json {
            operation: "storage.serialize",
            path: self.path.clone(),
            source,
        })?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload).map_err(|source| ConfigError::Io {
            operation: "storage.write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| ConfigError::Io {
            operation: "storage.rename",
            path: self.path.clone(),
            source,
        })
    }
}

/// Device preference, either persisted in local storage or fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicePreferences {
    /// Read from and written to local storage under [`DEVICE_KEY`].
    Persisted(LocalStorage),
    /// Always the given device; writes are ignored.
    Fixed(Device),
}

impl DevicePreferences {
    /// Build the preference source described by `setting`.
    #[must_use]
    pub fn from_setting(setting: &DeviceSetting) -> Self {
        match setting {
            DeviceSetting::Persisted { storage_path } => {
                Self::Persisted(LocalStorage::new(storage_path.clone()))
            }
            DeviceSetting::Fixed(device) => Self::Fixed(*device),
        }
    }

    /// Current device. Absent or unrecognised stored values yield the default.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage document cannot be read.
    pub fn load(&self) -> ConfigResult<Device> {
        let storage = match self {
            Self::Fixed(device) => return Ok(*device),
            Self::Persisted(storage) => storage,
        };
        let Some(raw) = storage.get(DEVICE_KEY)? else {
            return Ok(Device::default());
        };
        Ok(raw.parse::<Device>().unwrap_or_else(|_| {
            warn!(value = %raw, "ignoring unrecognised stored device");
            Device::default()
        }))
    }

    /// Record `device` as the preference.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage document cannot be written.
    pub fn store(&self, device: Device) -> ConfigResult<()> {
        match self {
            Self::Fixed(fixed) => {
                debug!(requested = %device, fixed = %fixed, "device preference is fixed");
                Ok(())
            }
            Self::Persisted(storage) => storage.set(DEVICE_KEY, device.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn device_defaults_to_cpu_when_never_set() -> Result<()> {
        let temp = TempDir::new()?;
        let prefs = DevicePreferences::Persisted(LocalStorage::new(temp.path().join("s.json")));
        assert_eq!(prefs.load()?, Device::Cpu);
        Ok(())
    }

    #[test]
    fn device_round_trips_across_reloads() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("nested").join("storage.json");
        DevicePreferences::Persisted(LocalStorage::new(&path)).store(Device::Cuda)?;

        let reloaded = DevicePreferences::from_setting(&DeviceSetting::Persisted {
            storage_path: path.clone(),
        });
        assert_eq!(reloaded.load()?, Device::Cuda);

        let raw = fs::read_to_string(&path)?;
        assert!(raw.contains("\"device\": \"cuda\""));
        Ok(())
    }

    #[test]
    fn other_keys_survive_device_writes() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = LocalStorage::new(temp.path().join("storage.json"));
        storage.set("theme", "dark")?;
        DevicePreferences::Persisted(storage.clone()).store(Device::Cuda)?;
        assert_eq!(storage.get("theme")?.as_deref(), Some("dark"));
        assert_eq!(storage.get(DEVICE_KEY)?.as_deref(), Some("cuda"));
        Ok(())
    }

    #[test]
    fn unrecognised_value_falls_back_to_default() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = LocalStorage::new(temp.path().join("storage.json"));
        storage.set(DEVICE_KEY, "quantum")?;
        assert_eq!(DevicePreferences::Persisted(storage).load()?, Device::Cpu);
        Ok(())
    }

    #[test]
    fn fixed_preference_ignores_writes() -> Result<()> {
        let prefs = DevicePreferences::Fixed(Device::Cuda);
        prefs.store(Device::Cpu)?;
        assert_eq!(prefs.load()?, Device::Cuda);
        Ok(())
    }

    #[test]
    fn corrupt_document_is_reported() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("storage.json");
        fs::write(&path, "[1, 2")?;
        let storage = LocalStorage::new(&path);
        assert!(matches!(
            storage.get(DEVICE_KEY),
            Err(ConfigError::Json {
                operation: "storage.parse",
                ..
            })
        ));
        Ok(())
    }
}
