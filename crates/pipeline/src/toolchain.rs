//! External collaborators the core invokes but does not implement:
//! `aapt2` proto→binary conversion, dex merging, and signing. Every
//! subprocess call is wrapped in the configured wall-clock timeout.

use std::path::Path;
use std::time::Duration;

use aabforge_core::{AabForgeError, Result};
use tokio::process::Command;
use tracing::debug;

/// `aapt2`'s two operations the pipeline needs: converting a proto-form
/// APK to the binary form devices expect, and dumping badging info for
/// diagnostics.
pub trait Aapt2Command: Send + Sync {
    fn convert_apk_proto_to_binary<'a>(
        &'a self,
        proto_apk: &'a Path,
        binary_apk: &'a Path,
    ) -> futures::future::BoxFuture<'a, Result<()>>;

    fn dump_badging<'a>(&'a self, apk: &'a Path) -> futures::future::BoxFuture<'a, Result<Vec<String>>>;
}

/// Signs packaged APK bytes and returns the signed bytes. Configuration
/// is opaque to the core; only the contract matters.
pub trait Signer: Send + Sync {
    fn sign<'a>(&'a self, apk_bytes: Vec<u8>, signer_config: &'a str) -> futures::future::BoxFuture<'a, Result<Vec<u8>>>;
}

/// Invokes a real `aapt2` binary found on `PATH` (or at an explicit
/// path), subject to `timeout`.
pub struct Aapt2Subprocess {
    binary: std::path::PathBuf,
    timeout: Duration,
}

impl Aapt2Subprocess {
    pub fn new(binary: impl Into<std::path::PathBuf>, timeout: Duration) -> Self {
        Aapt2Subprocess {
            binary: binary.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut command = Command::new(&self.binary);
        command.args(args);
        debug!(?self.binary, ?args, "invoking aapt2");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| AabForgeError::ToolTimeout(self.timeout, "aapt2".to_string()))??;
        Ok(output)
    }
}

impl Aapt2Command for Aapt2Subprocess {
    fn convert_apk_proto_to_binary<'a>(&'a self, proto_apk: &'a Path, binary_apk: &'a Path) -> futures::future::BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let proto = proto_apk.to_string_lossy();
            let binary = binary_apk.to_string_lossy();
            let output = self.run(&["convert", "--output-format", "binary", "-o", &binary, &proto]).await?;
            if !output.status.success() {
                return Err(AabForgeError::CommandExecution(format!(
                    "aapt2 convert failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )));
            }
            Ok(())
        })
    }

    fn dump_badging<'a>(&'a self, apk: &'a Path) -> futures::future::BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let path = apk.to_string_lossy();
            let output = self.run(&["dump", "badging", &path]).await?;
            // bundletool itself tolerates a non-zero exit here as long as
            // stdout carries the lines it needs; mirror that leniency.
            let lines = String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect();
            Ok(lines)
        })
    }
}

/// Invokes an external signer binary that reads APK bytes on stdin and
/// writes signed bytes to stdout, subject to `timeout`.
pub struct SubprocessSigner {
    binary: std::path::PathBuf,
    timeout: Duration,
}

impl SubprocessSigner {
    pub fn new(binary: impl Into<std::path::PathBuf>, timeout: Duration) -> Self {
        SubprocessSigner {
            binary: binary.into(),
            timeout,
        }
    }
}

impl Signer for SubprocessSigner {
    fn sign<'a>(&'a self, apk_bytes: Vec<u8>, signer_config: &'a str) -> futures::future::BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            use tokio::io::AsyncWriteExt;

            let mut child = Command::new(&self.binary)
                .arg(signer_config)
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .spawn()?;

            let mut stdin = child.stdin.take().expect("stdin piped");
            let write = tokio::spawn(async move {
                let _ = stdin.write_all(&apk_bytes).await;
            });

            let output = tokio::time::timeout(self.timeout, child.wait_with_output())
                .await
                .map_err(|_| AabForgeError::ToolTimeout(self.timeout, "signer".to_string()))??;
            let _ = write.await;

            if !output.status.success() {
                return Err(AabForgeError::CommandExecution(format!(
                    "signer failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )));
            }
            Ok(output.stdout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn aapt2_timeout_produces_tool_timeout_error() {
        let aapt2 = Aapt2Subprocess::new("sleep", Duration::from_millis(20));
        let result = aapt2.run(&["1"]).await;
        assert!(matches!(result, Err(AabForgeError::ToolTimeout(_, _))));
    }
}
