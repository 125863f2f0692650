//! Block-device resize seam.
//!
//! Growing a fabric volume happens on the target; the host side only needs
//! the kernel's size information refreshed and read back.  That primitive is
//! external to the attach protocol, so it sits behind the [`DeviceResizer`]
//! trait with [`BlockdevResizer`] as the command-backed default.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::NvmeError;
use crate::executor::CommandExecutor;
use crate::types::DevicePath;

/// Refreshes the kernel's view of a block device and reports its size.
#[async_trait]
pub trait DeviceResizer: Send + Sync {
    /// Rescan `path` and return its current size in bytes.
    async fn resize(&self, path: &DevicePath) -> Result<u64, NvmeError>;
}

/// Default resizer: `blockdev --getsize64` after an `nvme ns-rescan` of the
/// owning controller.  The rescan makes the kernel pick up a grown namespace;
/// the size read confirms it.
pub struct BlockdevResizer {
    executor: Arc<dyn CommandExecutor>,
}

impl BlockdevResizer {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

/// Derive the controller node (`/dev/nvme0`) from a namespace node
/// (`/dev/nvme0n1`).
fn controller_of(path: &DevicePath) -> Option<&str> {
    let s = path.0.as_str();
    let namespace_sep = s.rfind('n')?;
    // "/dev/nvme" itself ends in an 'n'; a controller node has digits after it.
    if namespace_sep <= s.find("nvme")? {
        return None;
    }
    Some(&s[..namespace_sep])
}

#[async_trait]
impl DeviceResizer for BlockdevResizer {
    async fn resize(&self, path: &DevicePath) -> Result<u64, NvmeError> {
        if let Some(controller) = controller_of(path) {
            // Rescan failures are not terminal: the kernel may already have
            // the new size, and the size read below is the authority.
            if let Err(e) = self.executor.run("nvme", &["ns-rescan", controller]).await {
                debug!(%path, error = %e, "namespace rescan failed, reading size anyway");
            }
        }

        let output = self
            .executor
            .run("blockdev", &["--getsize64", &path.0])
            .await
            .map_err(|e| NvmeError::ResizeFailed {
                path: path.0.clone(),
                reason: e.to_string(),
            })?;

        output
            .stdout
            .trim()
            .parse::<u64>()
            .map_err(|e| NvmeError::ResizeFailed {
                path: path.0.clone(),
                reason: format!("unparseable blockdev output {:?}: {e}", output.stdout.trim()),
            })
    }
}
