//! Detached launch of the external inference server.
//!
//! The command line is constructed here and never parsed:
//! `iopaint start --model=<model> --device=<device> --port=<port>`.

use std::process::{Command, Stdio};

use genfill_config::Device;
use tracing::info;

use crate::error::{HostError, HostResult};

/// Executable of the inference server.
pub const SERVER_PROGRAM: &str = "iopaint";

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;

/// Parameters of one server launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Inpainting model to load.
    pub model: String,
    /// Device the model runs on.
    pub device: Device,
    /// Port the server listens on.
    pub port: u16,
}

impl LaunchSpec {
    /// Arguments passed to [`SERVER_PROGRAM`].
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        vec![
            "start".to_string(),
            format!("--model={}", self.model),
            format!("--device={}", self.device),
            format!("--port={}", self.port),
        ]
    }

    /// Full command line, for logs and display.
    #[must_use]
    pub fn command_line(&self) -> String {
        format!("{SERVER_PROGRAM} {}", self.arguments().join(" "))
    }
}

/// Start the inference server as a background process and return its pid.
///
/// The child outlives the caller; a background thread reaps it on exit.
///
/// # Errors
///
/// Returns [`HostError::Launch`] when the program cannot be started.
pub fn spawn_detached(launch: &LaunchSpec) -> HostResult<u32> {
    spawn_program(SERVER_PROGRAM, launch)
}

fn spawn_program(program: &str, launch: &LaunchSpec) -> HostResult<u32> {
    let mut command = Command::new(program);
    command
        .args(launch.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(DETACHED_PROCESS);
    }

    let mut child = command.spawn().map_err(|source| HostError::Launch {
        program: program.to_string(),
        source,
    })?;
    let pid = child.id();
    info!(pid, command = %launch.command_line(), "inference server launched");
    std::thread::spawn(move || {
        if let Ok(status) = child.wait() {
            info!(pid, %status, "inference server exited");
        }
    });
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch(device: Device) -> LaunchSpec {
        LaunchSpec {
            model: "lama".to_string(),
            device,
            port: 7458,
        }
    }

    #[test]
    fn command_line_matches_server_cli() {
        assert_eq!(
            launch(Device::Cuda).command_line(),
            "iopaint start --model=lama --device=cuda --port=7458"
        );
        assert_eq!(launch(Device::Cpu).arguments()[2], "--device=cpu");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let result = spawn_program("genfill-no-such-server-binary", &launch(Device::Cpu));
        assert!(matches!(result, Err(HostError::Launch { .. })));
    }
}
