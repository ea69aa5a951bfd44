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

//! Generative fill panel wiring.
//!
//! Layout: `status.rs` (shared reachability cell), `view.rs` (indicator state and UI seam),
//! `poller.rs` (liveness polling), `artifacts.rs` (scoped artifact cleanup),
//! `fill.rs` (fill orchestrator), `panel.rs` (event loop tying it together).

/// Scoped cleanup of per-cycle artifacts.
pub mod artifacts;
/// Panel and fill errors.
pub mod error;
/// The generative fill cycle.
pub mod fill;
/// Panel event loop.
pub mod panel;
/// Liveness polling of the inference server.
pub mod poller;
/// Shared server status cell.
pub mod status;
/// Rendered panel state.
pub mod view;

pub use artifacts::ArtifactScope;
pub use error::{FillError, FillResult, PanelError, PanelResult};
pub use fill::{FillOrchestrator, FillOutcome};
pub use panel::{Panel, PanelEvent};
pub use poller::StatusPoller;
pub use status::{ServerStatus, StatusCell};
pub use view::{PanelUi, PanelView};
