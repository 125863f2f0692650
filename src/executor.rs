//! Privileged command execution seam.
//!
//! The connector never mutates the fabric device namespace directly; every
//! state change goes through an external tool (`nvme-cli`, `blockdev`, ...)
//! run with elevated rights.  [`CommandExecutor`] is the injection point for
//! that capability, and [`HostExecutor`] is the production implementation
//! over [`tokio::process`].  Tests substitute a scripted executor so no real
//! commands run.

use async_trait::async_trait;
use tracing::debug;

use crate::error::NvmeError;

/// Captured output of a completed command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

/// Runs a command line with elevated privilege and captures its output.
///
/// A non-zero exit status is an error ([`NvmeError::ProcessFailed`]), not a
/// success with bad output; callers only ever see output from commands that
/// completed successfully.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, wait for it, and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, NvmeError>;
}

/// Production executor: spawns the command on the host via [`tokio::process`].
///
/// Assumes the process already holds the privilege the fabric tools require
/// (the node agent runs as root); no `sudo` indirection is inserted here.
#[derive(Debug, Default)]
pub struct HostExecutor;

#[async_trait]
impl CommandExecutor for HostExecutor {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, NvmeError> {
        let rendered = render_command(program, args);
        debug!(command = %rendered, "running host command");

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| NvmeError::ProcessFailed {
                command: rendered.clone(),
                exit_code: None,
                stderr: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(NvmeError::ProcessFailed {
                command: rendered,
                exit_code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Render a command line for logs and error messages.
pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let out = HostExecutor.run("echo", &["hello"]).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_process_failure() {
        let err = HostExecutor.run("false", &[]).await.unwrap_err();
        match err {
            NvmeError::ProcessFailed { exit_code, .. } => assert_eq!(exit_code, Some(1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unspawnable_command_is_process_failure() {
        let err = HostExecutor
            .run("/nonexistent/binary/for/test", &[])
            .await
            .unwrap_err();
        match err {
            NvmeError::ProcessFailed { exit_code, .. } => assert_eq!(exit_code, None),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn renders_command_line() {
        assert_eq!(
            render_command("nvme", &["connect", "-t", "tcp"]),
            "nvme connect -t tcp"
        );
    }
}
