//! [`EditingHost`] backed by a string-evaluating script bridge.
//!
//! Every operation renders a [`ScriptCall`] against one of the host functions
//! below and hands it to the bridge. A reply starting with `Error` is a failure
//! the host script caught, and `EvalScript error.` is the bridge's reply for a
//! script that threw; any other reply is success.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::artifacts::{ArtifactSet, missing_or_io, read_offset_record};
use crate::error::{BridgeError, HostError, HostResult};
use crate::geometry::Offset;
use crate::host::EditingHost;
use crate::launcher::LaunchSpec;
use crate::script::{SELECTION_PROBE, ScriptCall};

/// Host function exporting the crop, mask and offset record.
pub const FN_SAVE_IMAGE_AND_MASK: &str = "saveImageAndMask";
/// Host function placing and aligning the result image.
pub const FN_PLACE_IMAGE_AS_RASTER: &str = "placeImageAsRaster";
/// Host function removing a file if it exists.
pub const FN_DELETE_FILE: &str = "deleteFile";
/// Host function launching the inference server.
pub const FN_START_SERVER: &str = "startServer";

const SELECTION_PROBE_NAME: &str = "selectionProbe";
const ERROR_REPLY_PREFIX: &str = "Error";
/// Reply the host bridge sends when evaluation of a script throws.
pub const EVAL_SCRIPT_ERROR_REPLY: &str = "EvalScript error.";

/// Transport that evaluates a script in the host and returns its text result.
#[async_trait]
pub trait ScriptBridge: Send + Sync {
    /// Evaluate `script` and return the host's reply.
    async fn eval(&self, script: &str) -> Result<String, BridgeError>;
}

/// Editing host driven through a [`ScriptBridge`].
#[derive(Debug)]
pub struct ScriptedHost<B> {
    bridge: B,
    artifact_root: Option<PathBuf>,
}

impl<B: ScriptBridge> ScriptedHost<B> {
    /// Wrap `bridge`.
    #[must_use]
    pub const fn new(bridge: B) -> Self {
        Self {
            bridge,
            artifact_root: None,
        }
    }

    /// Write fill artifacts under `root`, typically the extension directory
    /// reported by the host environment.
    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = Some(root.into());
        self
    }

    /// Underlying bridge.
    #[must_use]
    pub const fn bridge(&self) -> &B {
        &self.bridge
    }

    async fn eval(&self, function: &str, script: &str) -> HostResult<String> {
        debug!(function, "invoking host script");
        self.bridge
            .eval(script)
            .await
            .map_err(|source| HostError::Bridge {
                function: function.to_string(),
                source,
            })
    }

    async fn invoke(&self, call: &ScriptCall) -> HostResult<String> {
        let reply = self.eval(call.function(), &call.render()).await?;
        check_reply(call.function(), reply)
    }
}

fn check_reply(function: &str, reply: String) -> HostResult<String> {
    let trimmed = reply.trim();
    if trimmed.eq_ignore_ascii_case(EVAL_SCRIPT_ERROR_REPLY) {
        return Err(HostError::Script {
            function: function.to_string(),
            message: trimmed.to_string(),
        });
    }
    if let Some(message) = trimmed.strip_prefix(ERROR_REPLY_PREFIX) {
        return Err(HostError::Script {
            function: function.to_string(),
            message: message.trim_start_matches(':').trim().to_string(),
        });
    }
    Ok(trimmed.to_string())
}

async fn ensure_exists(path: &Path) -> HostResult<()> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|source| missing_or_io("artifact.stat", path, source))
}

#[async_trait]
impl<B: ScriptBridge> EditingHost for ScriptedHost<B> {
    fn artifact_root(&self) -> Option<&Path> {
        self.artifact_root.as_deref()
    }

    async fn has_selection(&self) -> HostResult<bool> {
        let reply = self.eval(SELECTION_PROBE_NAME, SELECTION_PROBE).await?;
        match reply.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(HostError::UnexpectedReply {
                function: SELECTION_PROBE_NAME.to_string(),
                reply,
            }),
        }
    }

    async fn export_selection(&self, artifacts: &ArtifactSet) -> HostResult<Offset> {
        let call = ScriptCall::new(FN_SAVE_IMAGE_AND_MASK)
            .path_arg(artifacts.image_path())
            .path_arg(artifacts.mask_path())
            .path_arg(artifacts.result_base());
        self.invoke(&call).await?;
        ensure_exists(artifacts.image_path()).await?;
        ensure_exists(artifacts.mask_path()).await?;
        read_offset_record(&artifacts.result_offset()).await
    }

    async fn place_result(&self, artifacts: &ArtifactSet) -> HostResult<()> {
        let call = ScriptCall::new(FN_PLACE_IMAGE_AS_RASTER).path_arg(artifacts.result_base());
        self.invoke(&call).await.map(|_| ())
    }

    async fn delete_artifact(&self, path: &Path) -> HostResult<()> {
        let call = ScriptCall::new(FN_DELETE_FILE).path_arg(path);
        self.invoke(&call).await.map(|_| ())
    }

    async fn start_server(&self, launch: &LaunchSpec) -> HostResult<()> {
        let call = ScriptCall::new(FN_START_SERVER)
            .arg(launch.model.clone())
            .arg(launch.device.as_str())
            .arg(launch.port.to_string());
        self.invoke(&call).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use genfill_config::Device;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Bridge that records scripts and answers like the host-side functions.
    struct FakeBridge {
        scripts: Mutex<Vec<String>>,
        selection: &'static str,
        fail_with: Option<&'static str>,
        export_files: bool,
    }

    impl FakeBridge {
        fn new() -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                selection: "true",
                fail_with: None,
                export_files: true,
            }
        }

        fn scripts(&self) -> Vec<String> {
            self.scripts
                .lock()
                .map(|scripts| scripts.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ScriptBridge for FakeBridge {
        async fn eval(&self, script: &str) -> Result<String, BridgeError> {
            self.scripts
                .lock()
                .map_err(|_| BridgeError::new("poisoned"))?
                .push(script.to_string());
            if script == SELECTION_PROBE {
                return Ok(self.selection.to_string());
            }
            if let Some(message) = self.fail_with {
                return Ok(format!("Error: {message}"));
            }
            let call = ScriptCall::parse(script).ok_or_else(|| BridgeError::new("unparsable"))?;
            if call.function() == FN_SAVE_IMAGE_AND_MASK && self.export_files {
                let args = call.args();
                std::fs::write(&args[0], b"image").map_err(|err| BridgeError::new(err.to_string()))?;
                std::fs::write(&args[1], b"mask").map_err(|err| BridgeError::new(err.to_string()))?;
                std::fs::write(format!("{}.txt", args[2]), "12,34")
                    .map_err(|err| BridgeError::new(err.to_string()))?;
            }
            Ok("undefined".to_string())
        }
    }

    #[tokio::test]
    async fn selection_probe_maps_literal_replies() -> Result<()> {
        let host = ScriptedHost::new(FakeBridge::new());
        assert!(host.has_selection().await?);

        let mut bridge = FakeBridge::new();
        bridge.selection = "false";
        assert!(!ScriptedHost::new(bridge).has_selection().await?);

        let mut bridge = FakeBridge::new();
        bridge.selection = "maybe";
        assert!(matches!(
            ScriptedHost::new(bridge).has_selection().await,
            Err(HostError::UnexpectedReply { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn export_renders_call_and_reads_offset() -> Result<()> {
        let temp = TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 42);
        let host = ScriptedHost::new(FakeBridge::new());

        let offset = host.export_selection(&artifacts).await?;
        assert_eq!(offset, Offset::new(12, 34));

        let scripts = host.bridge().scripts();
        let call = ScriptCall::parse(&scripts[0]).ok_or_else(|| anyhow::anyhow!("unparsable"))?;
        assert_eq!(call.function(), FN_SAVE_IMAGE_AND_MASK);
        assert_eq!(
            call.args(),
            [
                artifacts.image_path().display().to_string(),
                artifacts.mask_path().display().to_string(),
                artifacts.result_base().display().to_string(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn export_without_artifacts_is_an_error() -> Result<()> {
        let temp = TempDir::new()?;
        let mut bridge = FakeBridge::new();
        bridge.export_files = false;
        let host = ScriptedHost::new(bridge);
        let result = host
            .export_selection(&ArtifactSet::new(temp.path(), 7))
            .await;
        assert!(matches!(result, Err(HostError::MissingArtifact { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn host_error_replies_are_propagated() -> Result<()> {
        let temp = TempDir::new()?;
        let mut bridge = FakeBridge::new();
        bridge.fail_with = Some("Could not complete the Place command");
        let host = ScriptedHost::new(bridge);

        let result = host.place_result(&ArtifactSet::new(temp.path(), 1)).await;
        match result {
            Err(HostError::Script { function, message }) => {
                assert_eq!(function, FN_PLACE_IMAGE_AS_RASTER);
                assert_eq!(message, "Could not complete the Place command");
            }
            other => anyhow::bail!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    struct FixedReply(&'static str);

    #[async_trait]
    impl ScriptBridge for FixedReply {
        async fn eval(&self, _script: &str) -> Result<String, BridgeError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn bridge_evaluation_errors_are_failures() -> Result<()> {
        let temp = TempDir::new()?;
        let artifacts = ArtifactSet::new(temp.path(), 2);
        let host = ScriptedHost::new(FixedReply("EvalScript error."));

        let placed = host.place_result(&artifacts).await;
        assert!(matches!(
            placed,
            Err(HostError::Script { ref function, ref message })
                if function == FN_PLACE_IMAGE_AS_RASTER && message == EVAL_SCRIPT_ERROR_REPLY
        ));
        let deleted = host.delete_artifact(artifacts.image_path()).await;
        assert!(matches!(deleted, Err(HostError::Script { .. })));

        let shouting = ScriptedHost::new(FixedReply(" EVALSCRIPT ERROR. \n"));
        assert!(matches!(
            shouting.place_result(&artifacts).await,
            Err(HostError::Script { .. })
        ));
        assert!(ScriptedHost::new(FixedReply("undefined"))
            .place_result(&artifacts)
            .await
            .is_ok());
        Ok(())
    }

    #[test]
    fn artifact_root_is_supplied_only_when_configured() {
        assert_eq!(ScriptedHost::new(FakeBridge::new()).artifact_root(), None);
        let host = ScriptedHost::new(FakeBridge::new()).with_artifact_root("/ext/genfill");
        assert_eq!(host.artifact_root(), Some(Path::new("/ext/genfill")));
    }

    #[tokio::test]
    async fn delete_and_start_render_expected_calls() -> Result<()> {
        let host = ScriptedHost::new(FakeBridge::new());
        host.delete_artifact(Path::new(r#"C:\tmp\"odd"\mask_1.png"#))
            .await?;
        host.start_server(&LaunchSpec {
            model: "lama".to_string(),
            device: Device::Cuda,
            port: 7458,
        })
        .await?;

        let scripts = host.bridge().scripts();
        assert_eq!(scripts[0], r#"deleteFile("C:\\tmp\\\"odd\"\\mask_1.png")"#);
        assert_eq!(scripts[1], r#"startServer("lama","cuda","7458")"#);
        Ok(())
    }
}
