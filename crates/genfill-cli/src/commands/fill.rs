use std::sync::Arc;

use anyhow::anyhow;
use genfill_app::Panel;
use genfill_host::RasterHost;
use tracing::debug;

use crate::cli::FillArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::console::ConsoleUi;
use crate::output::render_fill;

pub(crate) async fn handle_fill(ctx: &AppContext, args: FillArgs) -> CliResult<()> {
    let FillArgs {
        image,
        selection,
        out,
        padding,
    } = args;
    let host = RasterHost::open(&image, padding.unwrap_or(ctx.config.padding_px)).map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context(format!("failed to open {}", image.display())))
    })?;
    host.select(selection).map_err(|_| {
        CliError::validation(format!(
            "selection does not overlap the {} image",
            image.display()
        ))
    })?;
    let host = Arc::new(host);

    let panel = Panel::new(&ctx.config, host.clone(), Arc::new(ConsoleUi))
        .map_err(|err| CliError::failure(anyhow::Error::new(err).context("failed to build panel")))?;
    let status = panel.poller().poll_once().await;
    debug!(status = %status, "server probed before fill");

    let Some(outcome) = panel.fill().await else {
        return Err(CliError::failure(anyhow!("generative fill did not complete")));
    };

    host.save_flattened(&out).map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context(format!("failed to write {}", out.display())))
    })?;
    render_fill(&outcome, &out, ctx.output)
}
