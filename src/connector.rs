//! Volume attach / detach / extend protocols.
//!
//! The fabric connect command does not report which device node it produced,
//! so [`VolumeConnector::attach`] discovers it by set difference: snapshot
//! the visible devices, connect, then poll for a node that was absent before.
//! That window is what the per-class locks protect; see [`LockRegistry`].
//!
//! Detach is idempotent (detaching an already-absent path is a no-op) and
//! extend is a thin delegation to the injected resize primitive.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::config::ConnectorConfig;
use crate::enumerator::DeviceEnumerator;
use crate::error::NvmeError;
use crate::executor::CommandExecutor;
use crate::locks::LockRegistry;
use crate::resize::{BlockdevResizer, DeviceResizer};
use crate::retry::{RetryPolicy, retry};
use crate::types::{
    ConnectionDescriptor, ConnectorProperties, DeviceInfo, DeviceKind, Operation,
};

/// Attaches, detaches, and resizes fabric volumes on the local host.
///
/// One connector instance per process: the lock registry it owns is what
/// serializes same-class operations, so callers must share the instance
/// rather than constructing one per call.
pub struct VolumeConnector {
    executor: Arc<dyn CommandExecutor>,
    enumerator: DeviceEnumerator,
    resizer: Arc<dyn DeviceResizer>,
    locks: LockRegistry,
    connect_retry: RetryPolicy,
    detection_retry: RetryPolicy,
}

impl VolumeConnector {
    /// Create a connector with the default [`BlockdevResizer`].
    pub fn new(config: ConnectorConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let resizer = Arc::new(BlockdevResizer::new(Arc::clone(&executor)));
        Self::with_resizer(config, executor, resizer)
    }

    /// Create a connector with a caller-supplied resize primitive.
    pub fn with_resizer(
        config: ConnectorConfig,
        executor: Arc<dyn CommandExecutor>,
        resizer: Arc<dyn DeviceResizer>,
    ) -> Self {
        Self {
            enumerator: DeviceEnumerator::new(
                Arc::clone(&executor),
                config.scan_attempts,
                config.scan_backoff_unit(),
            ),
            connect_retry: config.connect_retry(),
            detection_retry: config.detection_retry(),
            locks: LockRegistry::default(),
            resizer,
            executor,
        }
    }

    /// Attach the volume described by `descriptor` and report the device
    /// node that appeared for it.
    ///
    /// Serialized with all other attach calls: the before/after device diff
    /// would otherwise attribute a concurrent caller's new node to the
    /// wrong volume.
    #[instrument(
        skip(self, descriptor),
        fields(nqn = %descriptor.nqn, transport = %descriptor.transport_type),
    )]
    pub async fn attach(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<DeviceInfo, NvmeError> {
        let _guard = self.locks.acquire(Operation::Attach).await;

        let before = self.enumerator.list_devices().await?;
        debug!(count = before.len(), "device snapshot taken before connect");

        let mut args: Vec<&str> = vec![
            "connect",
            "-t",
            descriptor.transport_type.as_arg(),
            "-n",
            &descriptor.nqn,
            "-a",
            &descriptor.target_portal,
            "-s",
            &descriptor.target_port,
        ];
        if let Some(host_nqn) = &descriptor.host_nqn {
            args.extend(["-q", host_nqn.as_str()]);
        }

        let executor = &self.executor;
        let args = &args;
        retry(self.connect_retry, NvmeError::is_process_failure, || {
            async move { executor.run("nvme", args).await.map(|_| ()) }
        })
        .await?;

        // The kernel materializes the node asynchronously after the connect
        // command returns, so an empty diff here is an expected transient
        // condition with its own retry budget, distinct from command failure.
        let enumerator = &self.enumerator;
        let before = &before;
        let path = retry(
            self.detection_retry,
            |e| matches!(e, NvmeError::VolumePathsNotFound),
            || async move {
                let after = enumerator.list_devices().await?;
                let mut fresh: Vec<_> = after.difference(before).cloned().collect();
                if fresh.is_empty() {
                    debug!("no new device node visible yet");
                    return Err(NvmeError::VolumePathsNotFound);
                }
                if fresh.len() > 1 {
                    // A single connect is only ever expected to surface one
                    // namespace; keep the choice deterministic regardless.
                    warn!(
                        candidates = ?fresh,
                        "multiple new devices appeared, selecting the smallest path",
                    );
                }
                Ok(fresh.swap_remove(0))
            },
        )
        .await?;

        info!(%path, "volume attached");
        Ok(DeviceInfo {
            kind: DeviceKind::Block,
            path,
        })
    }

    /// Detach the volume's device node from the host.
    ///
    /// The target path is taken from `device_info` when present, falling
    /// back to [`ConnectionDescriptor::device_path`].  Detaching a path that
    /// is no longer visible succeeds without running anything.  `_force` is
    /// accepted for interface compatibility with other connector families
    /// and is currently unused.
    #[instrument(skip(self, descriptor, device_info), fields(nqn = %descriptor.nqn))]
    pub async fn detach(
        &self,
        descriptor: &ConnectionDescriptor,
        device_info: Option<&DeviceInfo>,
        _force: bool,
        ignore_errors: bool,
    ) -> Result<(), NvmeError> {
        let _guard = self.locks.acquire(Operation::Detach).await;

        let path = device_info
            .map(|info| &info.path)
            .or(descriptor.device_path.as_ref())
            .ok_or_else(|| {
                NvmeError::InvalidDescriptor("no device path supplied for detach".into())
            })?;

        let current = self.enumerator.list_devices().await?;
        if !current.contains(path) {
            warn!(%path, "device is not connected, nothing to detach");
            return Ok(());
        }

        debug!(%path, "disconnecting fabric device");
        match self
            .executor
            .run("nvme", &["disconnect", "-d", &path.0])
            .await
        {
            Ok(_) => {
                info!(%path, "volume detached");
                Ok(())
            }
            Err(e) => {
                error!(%path, error = %e, "failed to disconnect fabric device");
                if ignore_errors {
                    warn!(%path, "suppressing disconnect failure at caller's request");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Refresh the kernel's size information for the volume's device node
    /// and return the new size in bytes.
    ///
    /// Uses the path recorded in the descriptor directly; there is no
    /// discovery step here.
    #[instrument(skip(self, descriptor), fields(nqn = %descriptor.nqn))]
    pub async fn extend(&self, descriptor: &ConnectionDescriptor) -> Result<u64, NvmeError> {
        let _guard = self.locks.acquire(Operation::Resize).await;

        let Some(path) = descriptor.device_path.as_ref() else {
            warn!("no volume path on the host to extend");
            return Err(NvmeError::VolumePathsNotFound);
        };

        let size = self.resizer.resize(path).await?;
        info!(%path, size, "volume extended");
        Ok(size)
    }

    /// Host identity telemetry reported back to the control plane.
    ///
    /// Some backends need the hardware system UUID to map a node to its
    /// attachments.  Best effort: a missing or failing `dmidecode` degrades
    /// to empty properties, never an error.
    pub async fn connector_properties(&self) -> ConnectorProperties {
        let system_uuid = match self.executor.run("dmidecode", &[]).await {
            Ok(output) => {
                let uuid = parse_system_uuid(&output.stdout);
                if uuid.is_none() {
                    warn!("no system UUID present in dmidecode output");
                }
                uuid
            }
            Err(e) => {
                warn!(error = %e, "unable to run dmidecode for host identity");
                None
            }
        };
        if let Some(uuid) = &system_uuid {
            debug!(%uuid, "resolved host system UUID");
        }
        ConnectorProperties { system_uuid }
    }
}

/// Extract the system UUID from `dmidecode` output.
fn parse_system_uuid(out: &str) -> Option<String> {
    out.lines().map(str::trim).find_map(|line| {
        line.strip_prefix("UUID:")
            .map(|rest| rest.trim().to_owned())
            .filter(|uuid| !uuid.is_empty())
    })
}
