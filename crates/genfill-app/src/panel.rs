//! Panel wiring: status polling, rendering and user actions.
//!
//! # Design
//! - The poller and the renderer are background tasks; user events are handled
//!   one at a time on the caller's task.
//! - Failures of user actions become alerts; they never stop the loop.

use std::sync::Arc;

use genfill_client::InpaintClient;
use genfill_config::{Device, DevicePreferences, PanelConfig};
use genfill_host::{EditingHost, LaunchSpec};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use crate::error::{PanelError, PanelResult};
use crate::fill::{FillOrchestrator, FillOutcome};
use crate::poller::StatusPoller;
use crate::status::StatusCell;
use crate::view::{PanelUi, PanelView};

/// User action delivered to [`Panel::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// The fill control was clicked.
    Fill,
    /// The start-server control was clicked.
    StartServer,
    /// A device was chosen in the settings.
    SetDevice(Device),
    /// The panel is closing.
    Shutdown,
}

/// The generative fill panel.
pub struct Panel {
    host: Arc<dyn EditingHost>,
    ui: Arc<dyn PanelUi>,
    status: StatusCell,
    poller: StatusPoller,
    orchestrator: FillOrchestrator,
    preferences: DevicePreferences,
    model: String,
    port: u16,
}

impl Panel {
    /// Build a panel from `config`, driving `host` and drawing on `ui`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Client`] when the inference client cannot be built.
    pub fn new(
        config: &PanelConfig,
        host: Arc<dyn EditingHost>,
        ui: Arc<dyn PanelUi>,
    ) -> PanelResult<Self> {
        let client = InpaintClient::new(&config.endpoint, config.poll_interval)
            .map_err(|source| PanelError::Client { source })?;
        let status = StatusCell::new();
        let poller = StatusPoller::new(client.clone(), status.clone(), config.poll_interval);
        let orchestrator = FillOrchestrator::new(
            Arc::clone(&host),
            client,
            status.clone(),
            config.artifact_root.clone(),
        );
        Ok(Self {
            host,
            ui,
            status,
            poller,
            orchestrator,
            preferences: DevicePreferences::from_setting(&config.device),
            model: config.model.clone(),
            port: config.endpoint.port,
        })
    }

    /// Shared server status.
    #[must_use]
    pub const fn status(&self) -> &StatusCell {
        &self.status
    }

    /// Liveness poller feeding [`Panel::status`].
    #[must_use]
    pub const fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Fill orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &FillOrchestrator {
        &self.orchestrator
    }

    /// Current device preference.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Config`] when the preference store cannot be read.
    pub fn device(&self) -> PanelResult<Device> {
        self.preferences
            .load()
            .map_err(|err| PanelError::config("device.load", err))
    }

    /// Persist `device` as the preference.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Config`] when the preference store cannot be written.
    pub fn set_device(&self, device: Device) -> PanelResult<()> {
        self.preferences
            .store(device)
            .map_err(|err| PanelError::config("device.store", err))?;
        info!(device = %device, "device preference updated");
        Ok(())
    }

    /// Launch parameters for the current preference.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Config`] when the preference store cannot be read.
    pub fn launch_spec(&self) -> PanelResult<LaunchSpec> {
        Ok(LaunchSpec {
            model: self.model.clone(),
            device: self.device()?,
            port: self.port,
        })
    }

    /// Ask the host to launch the inference server.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Config`] when the device preference cannot be read
    /// and [`PanelError::Host`] when the launch fails.
    pub async fn start_server(&self) -> PanelResult<LaunchSpec> {
        let launch = self.launch_spec()?;
        self.host
            .start_server(&launch)
            .await
            .map_err(|err| PanelError::host("server.start", err))?;
        info!(command = %launch.command_line(), "inference server start requested");
        Ok(launch)
    }

    /// Run a fill, alerting on failure.
    #[must_use]
    pub async fn fill(&self) -> Option<FillOutcome> {
        match self.orchestrator.generative_fill().await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(error = %err, "generative fill rejected or failed");
                self.ui.alert(&err.user_message());
                None
            }
        }
    }

    async fn handle(&self, event: PanelEvent) {
        let result = match event {
            PanelEvent::Fill => {
                let _outcome = self.fill().await;
                Ok(())
            }
            PanelEvent::StartServer => self.start_server().await.map(|_| ()),
            PanelEvent::SetDevice(device) => self.set_device(device),
            PanelEvent::Shutdown => Ok(()),
        };
        if let Err(err) = result {
            warn!(error = %err, event = ?event, "panel action failed");
            self.ui.alert(&err.user_message());
        }
    }

    /// Poll, render and process `events` until [`PanelEvent::Shutdown`] arrives
    /// or the sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<PanelEvent>) {
        let poller = self.poller.clone().spawn();
        let renderer = spawn_renderer(&self.status, Arc::clone(&self.ui));
        info!("panel started");

        while let Some(event) = events.recv().await {
            if event == PanelEvent::Shutdown {
                break;
            }
            self.handle(event).await;
        }

        for (name, task) in [("poller", poller), ("renderer", renderer)] {
            task.abort();
            if let Err(err) = task.await
                && !err.is_cancelled()
            {
                warn!(error = %err, task = name, "panel task join failed");
            }
        }
        info!("panel stopped");
    }
}

fn spawn_renderer(status: &StatusCell, ui: Arc<dyn PanelUi>) -> JoinHandle<()> {
    let mut updates = WatchStream::new(status.subscribe());
    tokio::spawn(async move {
        while let Some(status) = updates.next().await {
            ui.render(&PanelView::from_status(&status));
        }
    })
}
