#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Configuration for the generative fill panel.
//!
//! Layout: `defaults.rs` (fixed constants), `model.rs` (typed config models),
//! `loader.rs` (environment loading), `storage.rs` (client-local storage and the
//! persisted device preference).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod storage;

pub use error::{ConfigError, ConfigResult};
pub use model::{Device, DeviceSetting, PanelConfig, ServerEndpoint};
pub use storage::{DEVICE_KEY, DevicePreferences, LocalStorage};
