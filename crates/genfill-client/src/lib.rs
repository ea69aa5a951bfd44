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

//! HTTP client for the local inpainting server.
//! Layout: error.rs (client errors), request.rs (inpaint payload), client.rs (probe and inpaint calls).

pub mod client;
pub mod error;
pub mod request;

pub use client::{API_INPAINT, API_SERVER_CONFIG, InpaintClient, ProbeOutcome};
pub use error::{ClientError, ClientResult};
pub use request::InpaintRequest;
