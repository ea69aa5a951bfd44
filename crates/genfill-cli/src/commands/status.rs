use anyhow::anyhow;
use genfill_app::{ServerStatus, StatusCell, StatusPoller};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

use crate::cli::StatusArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{OutputFormat, render_status};

pub(crate) async fn handle_status(ctx: &AppContext, args: StatusArgs) -> CliResult<()> {
    let status = StatusCell::new();
    let poller = StatusPoller::new(
        ctx.inpaint_client()?,
        status.clone(),
        ctx.config.poll_interval,
    );

    if args.watch {
        return watch_status(poller, &status, ctx.output).await;
    }

    let current = poller.poll_once().await;
    render_status(&current, ctx.output)?;
    if current.is_reachable() {
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "inference server at {} is not usable: {}",
            ctx.config.endpoint.base_url(),
            current.label()
        )))
    }
}

async fn watch_status(
    poller: StatusPoller,
    status: &StatusCell,
    format: OutputFormat,
) -> CliResult<()> {
    let mut updates = WatchStream::new(status.subscribe());
    let task = poller.spawn();

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                break signal.map_err(|err| {
                    CliError::failure(anyhow::Error::new(err).context("failed to listen for ctrl-c"))
                });
            }
            update = updates.next() => {
                let Some(current) = update else {
                    break Ok(());
                };
                if current == ServerStatus::Checking {
                    continue;
                }
                if let Err(err) = render_status(&current, format) {
                    break Err(err);
                }
            }
        }
    };

    task.abort();
    if let Err(err) = task.await
        && !err.is_cancelled()
    {
        warn!(error = %err, "status poller join failed");
    }
    result
}
