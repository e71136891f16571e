// src/utils/shell.rs
use std::io;
use std::process::Output;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ReconError, ReconResult};

/// Execute an external tool with the given arguments.
///
/// A missing binary is reported as `ExternalTool` so the caller can tell
/// "tool is broken" apart from "target is unreachable". A non-zero exit is
/// left to the caller, who knows what the tool's statuses mean.
pub async fn execute_tool(tool: &str, args: &[&str]) -> ReconResult<Output> {
    debug!("Executing: {} {}", tool, args.join(" "));

    let output = Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReconError::ExternalTool {
                tool: tool.to_string(),
                message: format!(
                    "{} not found. Please ensure it is installed and on PATH.",
                    tool
                ),
            },
            _ => ReconError::ExternalTool {
                tool: tool.to_string(),
                message: format!("Failed to execute: {}", e),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("{} exited with {}: {}", tool, output.status, stderr.trim());
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_external_tool_error() {
        let err = execute_tool("netrecon-no-such-binary", &["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn captures_stdout() {
        let output = execute_tool("echo", &["hello"]).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
