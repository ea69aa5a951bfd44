//! Output renderers and formatting helpers for CLI commands.

use std::path::Path;

use anyhow::anyhow;
use clap::ValueEnum;
use genfill_app::{FillOutcome, PanelView, ServerStatus};
use genfill_config::Device;
use genfill_host::LaunchSpec;
use serde::Serialize;

use crate::client::{CliError, CliResult};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    reachable: bool,
    label: String,
    indicator: &'a str,
    http_status: Option<u16>,
}

#[derive(Debug, Serialize)]
struct FillReport<'a> {
    timestamp: i64,
    x: i32,
    y: i32,
    output: &'a Path,
}

#[derive(Debug, Serialize)]
struct LaunchReport {
    pid: u32,
    command: String,
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn format_status_line(view: &PanelView) -> String {
    format!("[{}] {}", view.indicator, view.label)
}

pub(crate) fn render_status(status: &ServerStatus, format: OutputFormat) -> CliResult<()> {
    let view = PanelView::from_status(status);
    match format {
        OutputFormat::Json => print_json(&StatusReport {
            reachable: status.is_reachable(),
            label: view.label,
            indicator: view.indicator,
            http_status: match status {
                ServerStatus::HttpError { status } => Some(*status),
                _ => None,
            },
        }),
        OutputFormat::Table => {
            println!("{}", format_status_line(&view));
            if view.start_server_visible {
                println!("hint: run `genfill start-server` to launch the inference server");
            }
            Ok(())
        }
    }
}

pub(crate) fn render_fill(
    outcome: &FillOutcome,
    output: &Path,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&FillReport {
            timestamp: outcome.timestamp,
            x: outcome.offset.x,
            y: outcome.offset.y,
            output,
        }),
        OutputFormat::Table => {
            println!("fill placed at {}", outcome.offset);
            println!("written: {}", output.display());
            Ok(())
        }
    }
}

pub(crate) fn render_launch(pid: u32, launch: &LaunchSpec, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&LaunchReport {
            pid,
            command: launch.command_line(),
        }),
        OutputFormat::Table => {
            println!("started pid {pid}: {}", launch.command_line());
            Ok(())
        }
    }
}

pub(crate) fn render_device(device: Device, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "device": device })),
        OutputFormat::Table => {
            println!("{device}");
            Ok(())
        }
    }
}
