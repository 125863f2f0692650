//! Connector error types.
//!
//! All errors in the `libnvmeof` crate are represented by the [`NvmeError`]
//! enum, which derives [`thiserror::Error`].  The variants split along the
//! retry boundaries of the attach protocol: [`NvmeError::ProcessFailed`] and
//! [`NvmeError::VolumePathsNotFound`] are the two transient conditions that
//! get retried (with separate budgets), everything else is terminal.

use thiserror::Error;

/// Unified error type for connector operations.
#[derive(Debug, Error)]
pub enum NvmeError {
    /// An external command exited non-zero or could not be spawned.
    ///
    /// Transient at the call site that issued the command; retried there
    /// under the command-level budget and surfaced once that is exhausted.
    #[error("command `{command}` failed (exit code {exit_code:?}): {stderr}")]
    ProcessFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, or `None` if the process could not be spawned.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// Device enumeration exhausted its scan budget.  Fatal; enumeration
    /// retries internally and nothing above it retries again.
    #[error("failed to enumerate connected NVMe controllers: {0}")]
    CommandExecutionFailed(String),

    /// No device path could be resolved: either the post-attach device diff
    /// stayed empty through the whole detection budget, or an extend was
    /// requested for a descriptor carrying no path.
    #[error("no volume paths found on the host")]
    VolumePathsNotFound,

    /// The caller-supplied descriptor is missing a field the operation needs.
    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    /// The resize primitive failed for a resolved device path.
    #[error("resize of {path} failed: {reason}")]
    ResizeFailed {
        /// Device path the resize targeted.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl NvmeError {
    /// `true` for command failures, the retryable kind at the command level.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, NvmeError::ProcessFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = NvmeError::ProcessFailed {
            command: "nvme connect".into(),
            exit_code: Some(1),
            stderr: "Failed to write to /dev/nvme-fabrics".into(),
        };
        assert_eq!(
            err.to_string(),
            "command `nvme connect` failed (exit code Some(1)): \
             Failed to write to /dev/nvme-fabrics"
        );
        assert!(err.is_process_failure());
    }

    #[test]
    fn paths_not_found_is_not_a_process_failure() {
        assert!(!NvmeError::VolumePathsNotFound.is_process_failure());
    }
}
