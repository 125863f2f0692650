//! Fabric device enumeration.
//!
//! [`DeviceEnumerator`] answers one question: which NVMe namespace nodes are
//! visible on the host right now?  It runs `nvme list` through the injected
//! [`CommandExecutor`] and matches each output line against the namespace
//! naming pattern.  Pure observation; the only side effect is the command
//! invocation itself.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::NvmeError;
use crate::executor::CommandExecutor;
use crate::types::{DevicePath, DeviceSet};

/// Matches namespace block nodes like `/dev/nvme10n10` at the start of a
/// line.  Controller nodes (`/dev/nvme0`) and partitions are not candidates.
static DEVICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/dev/nvme[0-9]+n[0-9]+").expect("device pattern compiles"));

/// Extract the device path from one line of `nvme list` output.
///
/// Pure function, decoupled from command invocation so the parsing rules can
/// be tested on their own.  Lines not naming a namespace node yield `None`.
pub fn parse_device_line(line: &str) -> Option<DevicePath> {
    DEVICE_PATTERN
        .find(line)
        .map(|m| DevicePath(m.as_str().to_owned()))
}

/// Lists the currently visible fabric device nodes.
pub struct DeviceEnumerator {
    executor: Arc<dyn CommandExecutor>,
    scan_attempts: u32,
    scan_backoff_unit: Duration,
}

impl DeviceEnumerator {
    /// Create an enumerator running `nvme list` through `executor`.
    ///
    /// * `scan_attempts` — how many times a failing listing command is tried
    /// * `scan_backoff_unit` — base unit of the `attempt²` backoff schedule
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        scan_attempts: u32,
        scan_backoff_unit: Duration,
    ) -> Self {
        Self {
            executor,
            scan_attempts,
            scan_backoff_unit,
        }
    }

    /// Snapshot the set of visible namespace nodes.
    ///
    /// A failing listing command is retried up to the scan budget, sleeping
    /// `attempt² × unit` after each failure.  Exhaustion is promoted to
    /// [`NvmeError::CommandExecutionFailed`], which nothing above this layer
    /// retries again.
    pub async fn list_devices(&self) -> Result<DeviceSet, NvmeError> {
        for attempt in 1..=self.scan_attempts {
            match self.executor.run("nvme", &["list"]).await {
                Ok(output) => {
                    let devices: DeviceSet =
                        output.stdout.lines().filter_map(parse_device_line).collect();
                    debug!(count = devices.len(), "enumerated fabric devices");
                    return Ok(devices);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.scan_attempts,
                        error = %e,
                        "failed to list connected NVMe controllers, retrying",
                    );
                    tokio::time::sleep(self.scan_backoff_unit * attempt.saturating_mul(attempt))
                        .await;
                }
            }
        }
        Err(NvmeError::CommandExecutionFailed(
            "nvme list kept failing through the scan budget".into(),
        ))
    }
}
