//! Command-line front end for the generative fill panel.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use genfill_config::{ConfigError, Device, DeviceSetting, PanelConfig};
use genfill_host::Rect;
use genfill_telemetry::{LoggingConfig, init_logging};

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::device::{handle_device_get, handle_device_set};
use crate::commands::fill::handle_fill;
use crate::commands::server::handle_start_server;
use crate::commands::status::handle_status;
use crate::output::OutputFormat;

const CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command and reports failures
/// on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    install_logging();

    let result = match PanelConfig::from_env() {
        Ok(base) => execute(cli, base).await,
        Err(err) => Err(config_error(&err)),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn install_logging() {
    let config = match LoggingConfig::from_env() {
        Ok(config) => LoggingConfig {
            level: CLI_LOG_LEVEL,
            ..config
        },
        Err(err) => {
            eprintln!("warning: {err}; falling back to default log format");
            LoggingConfig {
                level: CLI_LOG_LEVEL,
                ..LoggingConfig::default()
            }
        }
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: failed to initialise logging: {err}");
    }
}

pub(crate) async fn execute(cli: Cli, base: PanelConfig) -> CliResult<()> {
    let ctx = AppContext {
        config: cli.overrides.apply(base),
        output: cli.output,
    };

    match cli.command {
        Command::Status(args) => handle_status(&ctx, args).await,
        Command::Fill(args) => handle_fill(&ctx, args).await,
        Command::StartServer => handle_start_server(&ctx),
        Command::Device(DeviceCommand::Get) => handle_device_get(&ctx),
        Command::Device(DeviceCommand::Set(args)) => handle_device_set(&ctx, args.device),
    }
}

pub(crate) fn config_error(err: &ConfigError) -> CliError {
    match err {
        ConfigError::InvalidField {
            field,
            value,
            reason,
        } => CliError::validation(format!(
            "invalid {field} '{}' ({reason})",
            value.as_deref().unwrap_or_default()
        )),
        other => CliError::validation(other.to_string()),
    }
}

#[derive(Parser)]
#[command(
    name = "genfill",
    about = "Generative fill against a local inpainting server"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) overrides: ConfigOverrides,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ConfigOverrides {
    #[arg(long, global = true, help = "Inference server host")]
    host: Option<String>,
    #[arg(
        long,
        global = true,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Inference server port"
    )]
    port: Option<u16>,
    #[arg(long, global = true, help = "Model passed to the server launcher")]
    model: Option<String>,
    #[arg(long, global = true, help = "Location of the preference storage file")]
    storage: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory for per-fill artifacts")]
    artifact_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_parser = parse_device,
        help = "Pin the device instead of using the stored preference"
    )]
    device: Option<Device>,
}

impl ConfigOverrides {
    pub(crate) fn apply(self, mut config: PanelConfig) -> PanelConfig {
        if let Some(host) = self.host {
            config.endpoint.host = host;
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(dir) = self.artifact_dir {
            config.artifact_root = dir;
        }
        if let Some(device) = self.device {
            config.device = DeviceSetting::Fixed(device);
        } else if let Some(storage_path) = self.storage {
            config.device = DeviceSetting::Persisted { storage_path };
        }
        config
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Probe the inference server.
    Status(StatusArgs),
    /// Fill a selection of an image.
    Fill(FillArgs),
    /// Launch the inference server in the background.
    StartServer,
    /// Read or change the device preference.
    #[command(subcommand)]
    Device(DeviceCommand),
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct StatusArgs {
    #[arg(long, help = "Keep polling and print every status change")]
    pub(crate) watch: bool,
}

#[derive(Args, Debug)]
pub(crate) struct FillArgs {
    #[arg(long, help = "Source image")]
    pub(crate) image: PathBuf,
    #[arg(
        long,
        value_parser = parse_rect,
        help = "Selection as left,top,right,bottom (right and bottom exclusive)"
    )]
    pub(crate) selection: Rect,
    #[arg(long, help = "Where the flattened result is written")]
    pub(crate) out: PathBuf,
    #[arg(long, help = "Margin added around the selection")]
    pub(crate) padding: Option<u32>,
}

#[derive(Subcommand)]
pub(crate) enum DeviceCommand {
    /// Print the current device.
    Get,
    /// Store a new device preference.
    Set(DeviceSetArgs),
}

#[derive(Args, Debug)]
pub(crate) struct DeviceSetArgs {
    #[arg(value_parser = parse_device)]
    pub(crate) device: Device,
}

fn parse_device(value: &str) -> Result<Device, String> {
    value
        .parse()
        .map_err(|_| format!("unknown device '{value}' (expected cpu or cuda)"))
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not a non-empty left,top,right,bottom rectangle"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use genfill_config::ServerEndpoint;

    #[test]
    fn flags_override_environment_configuration() -> Result<()> {
        let cli = Cli::try_parse_from([
            "genfill",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--storage",
            "/tmp/prefs.json",
            "status",
        ])?;
        let config = cli.overrides.apply(PanelConfig::default());
        assert_eq!(
            config.endpoint,
            ServerEndpoint {
                host: "127.0.0.1".to_string(),
                port: 9000,
            }
        );
        assert_eq!(
            config.device,
            DeviceSetting::Persisted {
                storage_path: PathBuf::from("/tmp/prefs.json")
            }
        );
        assert!(matches!(cli.command, Command::Status(StatusArgs { watch: false })));
        Ok(())
    }

    #[test]
    fn pinned_device_wins_over_storage() -> Result<()> {
        let cli = Cli::try_parse_from([
            "genfill", "device", "get", "--device", "cuda", "--storage", "/tmp/p.json",
        ])?;
        let config = cli.overrides.apply(PanelConfig::default());
        assert_eq!(config.device, DeviceSetting::Fixed(Device::Cuda));
        Ok(())
    }

    #[test]
    fn fill_arguments_are_validated() -> Result<()> {
        let cli = Cli::try_parse_from([
            "genfill",
            "fill",
            "--image",
            "in.png",
            "--selection",
            "10,10,110,110",
            "--out",
            "out.png",
        ])?;
        let Command::Fill(args) = cli.command else {
            anyhow::bail!("expected fill command");
        };
        assert_eq!(args.selection, Rect::new(10, 10, 110, 110));
        assert_eq!(args.padding, None);

        for selection in ["5,5,1,1", "1,2,3", "a,b,c,d"] {
            let parsed = Cli::try_parse_from([
                "genfill",
                "fill",
                "--image",
                "in.png",
                "--selection",
                selection,
                "--out",
                "out.png",
            ]);
            assert!(parsed.is_err(), "{selection} should be rejected");
        }
        assert!(Cli::try_parse_from(["genfill", "--port", "0", "status"]).is_err());
        assert!(Cli::try_parse_from(["genfill", "device", "set", "tpu"]).is_err());
        Ok(())
    }

    #[test]
    fn invalid_fields_become_validation_errors() {
        let err = config_error(&ConfigError::InvalidField {
            field: "port",
            value: Some("0".to_string()),
            reason: "zero",
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "invalid port '0' (zero)");
    }
}
