//! Connector configuration.
//!
//! Every retry scope in the crate is bounded, and every bound lives here so
//! deployments can tune the effective operation timeout
//! (attempts × backoff schedule) without code changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Attempt counts and backoff units for the connector's retry scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Attempts for the `nvme list` enumeration command.
    pub scan_attempts: u32,
    /// Backoff unit (seconds) for the enumeration scan; the delay after
    /// attempt *n* is `n²` units.
    pub scan_backoff_secs: u64,
    /// Attempts for the fabric connect command.
    pub connect_attempts: u32,
    /// Attempts for post-attach device-appearance detection.
    pub detection_attempts: u32,
    /// Backoff unit (seconds) shared by the connect and detection scopes.
    pub retry_backoff_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            scan_attempts: 5,
            scan_backoff_secs: 1,
            connect_attempts: 3,
            detection_attempts: 3,
            retry_backoff_secs: 1,
        }
    }
}

impl ConnectorConfig {
    /// Backoff unit for the enumeration scan.
    pub fn scan_backoff_unit(&self) -> Duration {
        Duration::from_secs(self.scan_backoff_secs)
    }

    /// Budget for issuing the fabric connect command.
    pub fn connect_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_attempts,
            backoff_unit: Duration::from_secs(self.retry_backoff_secs),
        }
    }

    /// Budget for waiting on the new device node to materialize.
    pub fn detection_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.detection_attempts,
            backoff_unit: Duration::from_secs(self.retry_backoff_secs),
        }
    }
}
