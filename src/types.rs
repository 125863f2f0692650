//! Core data model: connection descriptors, device paths, and attach results.
//!
//! These types form the contract between the storage control plane and the
//! host-side connector.  They are all [`Serialize`]/[`Deserialize`] so the
//! control plane can ship them to the node agent as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Fabric transport carrying the NVMe traffic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// RDMA (RoCE / InfiniBand / iWARP).
    Rdma,
    /// Plain TCP.
    Tcp,
    /// Fibre Channel.
    Fc,
}

impl TransportType {
    /// The value passed to `nvme connect -t`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            TransportType::Rdma => "rdma",
            TransportType::Tcp => "tcp",
            TransportType::Fc => "fc",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

// ---------------------------------------------------------------------------
// Connection descriptor
// ---------------------------------------------------------------------------

/// Everything the connector needs to reach one volume on a fabric target.
///
/// Supplied by the control plane per call, never persisted on the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// NVMe subsystem qualified name of the volume.
    pub nqn: String,
    /// Address of the target hosting the subsystem.
    pub target_portal: String,
    /// Port on the target portal.
    pub target_port: String,
    /// Fabric transport to connect over.
    pub transport_type: TransportType,
    /// Host NQN to present to the target, when the target enforces one.
    #[serde(default)]
    pub host_nqn: Option<String>,
    /// Local device path recorded by a prior attach.  Consulted by detach
    /// (as a fallback to [`DeviceInfo::path`]) and by extend.
    #[serde(default)]
    pub device_path: Option<DevicePath>,
}

// ---------------------------------------------------------------------------
// Device identity
// ---------------------------------------------------------------------------

/// A host block-device node such as `/dev/nvme0n1`.
///
/// Opaque after construction; only [`crate::enumerator::parse_device_line`]
/// and control-plane payloads produce these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevicePath(pub String);

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DevicePath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Snapshot of the fabric device nodes visible at one instant.
///
/// Ordered so that set difference iterates paths lexicographically, which is
/// what makes multi-new-device selection deterministic.
pub type DeviceSet = BTreeSet<DevicePath>;

// ---------------------------------------------------------------------------
// Attach result
// ---------------------------------------------------------------------------

/// Category of device produced by an attach.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// A block device node.
    Block,
}

/// Result of a successful attach: the local device node backing the volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Always [`DeviceKind::Block`] for fabric volumes.
    pub kind: DeviceKind,
    /// The device node that appeared as a result of the attach.
    pub path: DevicePath,
}

// ---------------------------------------------------------------------------
// Operation classes
// ---------------------------------------------------------------------------

/// Operation classes serialized by the connector's lock registry.
///
/// Two operations of the same class never run concurrently; operations of
/// different classes interleave freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Volume attach (connect + device discovery).
    Attach,
    /// Volume detach.
    Detach,
    /// Volume resize.
    Resize,
}

// ---------------------------------------------------------------------------
// Host telemetry
// ---------------------------------------------------------------------------

/// Auxiliary host identity reported to the control plane.
///
/// Some backends use the hardware UUID to map a node to its fabric
/// attachments; it has no coupling to the attach protocol itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorProperties {
    /// Hardware system UUID, when the host exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_uuid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_args() {
        assert_eq!(TransportType::Rdma.as_arg(), "rdma");
        assert_eq!(TransportType::Tcp.as_arg(), "tcp");
        assert_eq!(TransportType::Fc.to_string(), "fc");
    }

    #[test]
    fn device_path_display_and_order() {
        let a = DevicePath::from("/dev/nvme0n1");
        let b = DevicePath::from("/dev/nvme1n1");
        assert_eq!(a.to_string(), "/dev/nvme0n1");
        assert!(a < b);
    }

    #[test]
    fn descriptor_deserializes_without_optional_fields() {
        let json = r#"{
            "nqn": "nqn.2024-01.io.example:vol-1",
            "target_portal": "10.0.0.5",
            "target_port": "4420",
            "transport_type": "tcp"
        }"#;
        let desc: ConnectionDescriptor = serde_json::from_str(json).expect("deserialize");
        assert_eq!(desc.transport_type, TransportType::Tcp);
        assert!(desc.host_nqn.is_none());
        assert!(desc.device_path.is_none());
    }

    #[test]
    fn device_info_kind_serializes_as_block() {
        let info = DeviceInfo {
            kind: DeviceKind::Block,
            path: DevicePath::from("/dev/nvme1n1"),
        };
        let json = serde_json::to_string(&info).expect("serialize");
        assert!(json.contains(r#""kind":"block""#));
        assert!(json.contains(r#""path":"/dev/nvme1n1""#));
    }
}
