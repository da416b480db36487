use std::collections::HashMap;
use std::sync::Arc;

use everscale_types::models::StdAddr;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<StdAddr, Arc<AsyncMutex<()>>>;

/// Per-sender async locks. Two deployments from the same wallet never
/// interleave their seqno read and submission.
#[derive(Debug, Clone, Default)]
pub struct DeploymentLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Exclusive use of one sender. The sender's entry is dropped from the
/// map once nobody holds or waits for it.
#[derive(Debug)]
pub struct SenderGuard {
    guard: Option<OwnedMutexGuard<()>>,
    sender: StdAddr,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for SenderGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.lock();
        if map
            .get(&self.sender)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.sender);
        }
    }
}

impl DeploymentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `sender`. Released when the guard drops.
    pub async fn acquire(&self, sender: &StdAddr) -> SenderGuard {
        let lock = {
            let mut map = self.inner.lock();
            Arc::clone(map.entry(sender.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        SenderGuard {
            guard: Some(guard),
            sender: sender.clone(),
            locks: Arc::clone(&self.inner),
        }
    }

    /// Number of senders currently held or waited for.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::address::std_addr;

    #[tokio::test]
    async fn same_sender_is_serialized() {
        let locks = DeploymentLocks::new();
        let sender = std_addr(0, [1; 32]);

        let guard = locks.acquire(&sender).await;
        let second = {
            let locks = locks.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&sender).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_senders_do_not_block() {
        let locks = DeploymentLocks::new();
        let _a = locks.acquire(&std_addr(0, [1; 32])).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&std_addr(0, [2; 32])),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn released_senders_are_pruned() {
        let locks = DeploymentLocks::new();
        for i in 0..50u8 {
            let _guard = locks.acquire(&std_addr(0, [i; 32])).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = DeploymentLocks::new();
        let sender = std_addr(0, [7; 32]);

        let first = locks.acquire(&sender).await;
        let waiter = {
            let locks = locks.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&sender).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }
}
