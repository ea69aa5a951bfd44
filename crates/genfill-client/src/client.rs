//! Calls against the inpainting server's two endpoints.

use std::time::Duration;

use genfill_config::ServerEndpoint;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::InpaintRequest;

/// Liveness endpoint polled by the status indicator.
pub const API_SERVER_CONFIG: &str = "/api/v1/server-config";
/// Inference endpoint.
pub const API_INPAINT: &str = "/api/v1/inpaint";

/// Result of one liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with a 2xx status.
    Reachable,
    /// The server answered with a non-success status.
    HttpError {
        /// HTTP status code.
        status: u16,
    },
    /// No response was received (refused, reset, timed out).
    Unreachable {
        /// Transport error text.
        detail: String,
    },
}

/// Client for the local inpainting server.
#[derive(Debug, Clone)]
pub struct InpaintClient {
    client: Client,
    base_url: Url,
    probe_timeout: Duration,
}

impl InpaintClient {
    /// Client for `endpoint`; liveness probes give up after `probe_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when the endpoint does not form a URL
    /// and [`ClientError::Build`] when the HTTP client cannot be constructed.
    pub fn new(endpoint: &ServerEndpoint, probe_timeout: Duration) -> ClientResult<Self> {
        let base = endpoint.base_url();
        let base_url = base
            .parse::<Url>()
            .map_err(|source| ClientError::InvalidUrl {
                value: base.clone(),
                source,
            })?;
        Self::with_base_url(base_url, probe_timeout)
    }

    /// Client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the HTTP client cannot be constructed.
    pub fn with_base_url(base_url: Url, probe_timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ClientError::Build { source })?;
        Ok(Self {
            client,
            base_url,
            probe_timeout,
        })
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| ClientError::InvalidUrl {
                value: path.to_string(),
                source,
            })
    }

    /// Issue one liveness probe. Never fails; every outcome is a value.
    pub async fn probe(&self) -> ProbeOutcome {
        let url = match self.endpoint(API_SERVER_CONFIG) {
            Ok(url) => url,
            Err(err) => {
                return ProbeOutcome::Unreachable {
                    detail: err.to_string(),
                };
            }
        };
        match self
            .client
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ProbeOutcome::Reachable,
            Ok(response) => ProbeOutcome::HttpError {
                status: response.status().as_u16(),
            },
            Err(err) => {
                debug!(error = %err, "liveness probe failed");
                ProbeOutcome::Unreachable {
                    detail: err.to_string(),
                }
            }
        }
    }

    /// Post `request` to the inference endpoint and return the raw image bytes.
    ///
    /// No timeout applies; a hung server blocks until it answers or the
    /// connection drops.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the request or body read fails and
    /// [`ClientError::Status`] when the server answers with a non-success status.
    pub async fn inpaint(&self, request: &InpaintRequest) -> ClientResult<Vec<u8>> {
        let url = self.endpoint(API_INPAINT)?;
        let endpoint = url.to_string();
        let transport = |source| ClientError::Transport {
            endpoint: endpoint.clone(),
            source,
        };

        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transport)?;
        debug!(endpoint = %url, bytes = bytes.len(), "inpaint response received");
        Ok(bytes.to_vec())
    }
}
