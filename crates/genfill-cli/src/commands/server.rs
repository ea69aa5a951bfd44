use genfill_host::launcher::spawn_detached;
use tracing::info;

use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_launch;

pub(crate) fn handle_start_server(ctx: &AppContext) -> CliResult<()> {
    let launch = ctx.launch_spec()?;
    let pid = spawn_detached(&launch)
        .map_err(|err| CliError::failure(anyhow::Error::new(err).context("Error starting server")))?;
    info!(pid, command = %launch.command_line(), "inference server launched");
    render_launch(pid, &launch, ctx.output)
}
