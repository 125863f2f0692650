//! # libnvmeof — NVMe-over-Fabrics volume connector
//!
//! `libnvmeof` is the host-side data-plane agent that attaches, detaches,
//! and resizes NVMe-oF block volumes on behalf of a storage control plane.
//! It turns an abstract [`ConnectionDescriptor`] (subsystem NQN, target
//! portal and port, transport) into a concrete `/dev/nvmeXnY` node, driving
//! `nvme-cli` through an injected [`executor::CommandExecutor`] and following
//! the RK8s architecture conventions (Tokio async runtime, `tracing` for
//! observability, `thiserror` for structured errors).
//!
//! The heart of the crate is the attach protocol in [`connector`]: the
//! fabric connect command does not say which device node it created, so the
//! connector snapshots the visible device set, connects, and diffs a later
//! snapshot under a bounded polling retry.  Same-class operations are
//! serialized through a per-instance lock registry so concurrent attaches
//! cannot misattribute each other's new nodes.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Core data model: descriptors, device paths, attach results. |
//! | [`error`] | [`NvmeError`] enum covering all failure modes. |
//! | [`executor`] | Privileged command execution seam + host implementation. |
//! | [`enumerator`] | `nvme list` invocation and device-path parsing. |
//! | [`retry`] | Bounded retry combinator with quadratic backoff. |
//! | [`locks`] | Per-operation-class serialization. |
//! | [`connector`] | Attach / detach / extend protocols. |
//! | [`resize`] | Block-device resize seam + `blockdev`-backed default. |
//! | [`config`] | Retry budgets and backoff units. |

pub mod config;
pub mod connector;
pub mod enumerator;
pub mod error;
pub mod executor;
pub mod locks;
pub mod resize;
pub mod retry;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use config::ConnectorConfig;
pub use connector::VolumeConnector;
pub use error::NvmeError;
pub use executor::{CommandExecutor, HostExecutor};
pub use resize::DeviceResizer;
pub use types::*;
