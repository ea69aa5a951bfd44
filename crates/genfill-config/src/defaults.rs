//! Default values for the panel configuration.
//!
//! # Design
//! - Centralize fixed constants so the poller, host and client agree on them.

/// Host the inference server listens on.
pub const DEFAULT_HOST: &str = "localhost";
/// Port the inference server listens on.
pub const DEFAULT_PORT: u16 = 7458;
/// Inpainting model requested when launching the server.
pub const DEFAULT_MODEL: &str = "lama";
/// Interval between two status probes.
pub const POLL_INTERVAL_MS: u64 = 2_000;
/// Margin added around a selection to give the model surrounding context.
pub const SELECTION_PADDING_PX: u32 = 50;
/// Directory name used for fill artifacts under the system temp dir.
pub const ARTIFACT_DIR_NAME: &str = "genfill";
/// File name of the client-local storage document.
pub const STORAGE_FILE_NAME: &str = "storage.json";
