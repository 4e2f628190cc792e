use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use crate::errors::HunterError;
use tracing::debug;

/// Captured output of a finished tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ToolOutput {
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Run an external tool to completion. The child is killed if it outlives
/// `timeout` or if the returned future is dropped.
pub async fn run_tool(program: &str, args: &[String], timeout: Duration) -> Result<ToolOutput, HunterError> {
    debug!(program = %program, args = ?args, "Executing tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                HunterError::ToolExecution(format!("{} not found in PATH", program))
            }
            _ => HunterError::ToolExecution(format!("Failed to execute {}: {}", program, e)),
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| HunterError::Timeout(format!("{} timed out after {}s", program, timeout.as_secs())))?
        .map_err(|e| HunterError::ToolExecution(format!("{} failed: {}", program, e)))?;

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_tool_error() {
        let err = run_tool("hunter-no-such-tool", &[], Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, HunterError::ToolExecution(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_tool("echo", &["hello".to_string()], Duration::from_secs(5)).await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_tool() {
        let err = run_tool("sleep", &["5".to_string()], Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, HunterError::Timeout(_)));
    }
}
