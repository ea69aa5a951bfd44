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
#![allow(clippy::module_name_repetitions)]

//! Editing host capability used by the fill orchestrator.
//!
//! Layout:
//! - `geometry.rs`: selection rectangles and placement offsets
//! - `artifacts.rs`: per-cycle artifact paths and the offset record
//! - `script.rs`: host script call convention (rendering, escaping, parsing)
//! - `host.rs`: the typed `EditingHost` capability
//! - `scripted.rs`: `EditingHost` over a string-evaluating script bridge
//! - `raster.rs`: in-process raster document host
//! - `launcher.rs`: detached launch of the inference server

pub mod artifacts;
pub mod error;
pub mod geometry;
pub mod host;
pub mod launcher;
pub mod raster;
pub mod script;
pub mod scripted;

pub use artifacts::ArtifactSet;
pub use error::{BridgeError, HostError, HostResult};
pub use geometry::{Offset, Rect};
pub use host::EditingHost;
pub use launcher::LaunchSpec;
pub use raster::{Document, Layer, RasterHost};
pub use script::ScriptCall;
pub use scripted::{ScriptBridge, ScriptedHost};
