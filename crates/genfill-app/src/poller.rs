use std::time::Duration;

use genfill_client::InpaintClient;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::status::{ServerStatus, StatusCell};

/// Periodic liveness probe writing into a [`StatusCell`].
#[derive(Debug, Clone)]
pub struct StatusPoller {
    client: InpaintClient,
    status: StatusCell,
    interval: Duration,
}

impl StatusPoller {
    /// Poller probing through `client` every `interval`.
    #[must_use]
    pub const fn new(client: InpaintClient, status: StatusCell, interval: Duration) -> Self {
        Self {
            client,
            status,
            interval,
        }
    }

    /// Probe once and publish the result.
    #[must_use]
    pub async fn poll_once(&self) -> ServerStatus {
        let outcome = self.client.probe().await;
        let status = ServerStatus::from_probe(&outcome);
        if self.status.publish(status.clone()) {
            if status.is_reachable() {
                info!(status = %status, "inference server status changed");
            } else {
                warn!(status = %status, outcome = ?outcome, "inference server status changed");
            }
        }
        status
    }

    /// Probe immediately, then every interval, until the task is aborted.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = self.poll_once().await;
                debug!(status = %status, "liveness probe completed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use genfill_client::API_SERVER_CONFIG;
    use httpmock::prelude::*;

    fn poller_for(base_url: &str, status: &StatusCell) -> Result<StatusPoller> {
        let client = InpaintClient::with_base_url(
            base_url.parse().map_err(|_| anyhow!("valid URL"))?,
            Duration::from_millis(500),
        )?;
        Ok(StatusPoller::new(
            client,
            status.clone(),
            Duration::from_millis(50),
        ))
    }

    #[tokio::test]
    async fn status_follows_server_responses() -> Result<()> {
        for (code, expected) in [
            (200, ServerStatus::Connected),
            (404, ServerStatus::HttpError { status: 404 }),
            (500, ServerStatus::HttpError { status: 500 }),
        ] {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(GET).path(API_SERVER_CONFIG);
                then.status(code);
            });
            let status = StatusCell::new();
            let poller = poller_for(&server.base_url(), &status)?;

            assert_eq!(poller.poll_once().await, expected);
            assert_eq!(status.current(), expected);
            assert_eq!(status.is_reachable(), code == 200);
        }
        Ok(())
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() -> Result<()> {
        let status = StatusCell::new();
        let poller = poller_for("http://127.0.0.1:9", &status)?;
        assert_eq!(poller.poll_once().await, ServerStatus::Unreachable);
        assert!(!status.is_reachable());
        Ok(())
    }

    #[tokio::test]
    async fn spawned_poller_probes_immediately() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path(API_SERVER_CONFIG);
            then.status(200);
        });
        let status = StatusCell::new();
        let mut rx = status.subscribe();
        let handle = poller_for(&server.base_url(), &status)?.spawn();

        time::timeout(Duration::from_secs(5), rx.changed()).await??;
        assert_eq!(status.current(), ServerStatus::Connected);
        handle.abort();
        assert!(mock.calls() >= 1);
        Ok(())
    }
}
