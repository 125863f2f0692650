//! Per-operation-class serialization.
//!
//! The attach protocol identifies its device by diffing two enumeration
//! snapshots, so two attach calls racing through that window would each
//! attribute the other's new node to itself.  [`LockRegistry`] rules that
//! out: one mutex per [`Operation`] class, owned by the connector instance
//! rather than hidden in global state.  Different classes never block each
//! other.

use tokio::sync::{Mutex, MutexGuard};

use crate::types::Operation;

/// One mutex per operation class.
#[derive(Debug, Default)]
pub struct LockRegistry {
    attach: Mutex<()>,
    detach: Mutex<()>,
    resize: Mutex<()>,
}

impl LockRegistry {
    /// Acquire the lock for `operation`, waiting behind any in-flight
    /// operation of the same class.
    pub async fn acquire(&self, operation: Operation) -> MutexGuard<'_, ()> {
        match operation {
            Operation::Attach => self.attach.lock().await,
            Operation::Detach => self.detach.lock().await,
            Operation::Resize => self.resize.lock().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn same_class_operations_serialize() {
        let registry = Arc::new(LockRegistry::default());
        let in_flight = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire(Operation::Attach).await;
                assert_eq!(in_flight.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_classes_do_not_block_each_other() {
        let registry = LockRegistry::default();
        let _attach = registry.acquire(Operation::Attach).await;
        // Must not deadlock while the attach lock is held.
        let _detach = registry.acquire(Operation::Detach).await;
        let _resize = registry.acquire(Operation::Resize).await;
    }
}
