use genfill_config::{Device, DeviceSetting};
use tracing::info;

use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_device;

pub(crate) fn handle_device_get(ctx: &AppContext) -> CliResult<()> {
    render_device(ctx.device()?, ctx.output)
}

pub(crate) fn handle_device_set(ctx: &AppContext, device: Device) -> CliResult<()> {
    if let DeviceSetting::Fixed(fixed) = ctx.config.device {
        return Err(CliError::validation(format!(
            "device is pinned to {fixed}; unset GENFILL_DEVICE or drop --device to change it"
        )));
    }
    ctx.preferences()
        .store(device)
        .map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context("failed to store device preference"))
        })?;
    info!(device = %device, "device preference updated");
    render_device(device, ctx.output)
}
