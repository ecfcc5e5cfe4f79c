//! Per-key async locks
//!
//! Serializes check-then-write sequences for one user inside the process.
//! Storage-level guards still apply across processes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct KeyedLocks {
    locks: Arc<LockMap>,
}

pub type SharedKeyedLocks = Arc<KeyedLocks>;

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedKeyedLocks {
        Arc::new(Self::new())
    }

    /// Wait for exclusive access to `key`. Released when the guard drops;
    /// the last holder also removes the key's entry.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one key
pub struct KeyGuard {
    key: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // only the map's own reference left: nobody holds or waits on it
        self.locks
            .remove_if(&self.key, |_, m| Arc::strong_count(m) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyedLocks::shared();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("u1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("u1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("u2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_keys_leave_the_map() {
        let locks = KeyedLocks::new();
        let held = locks.lock("u1").await;
        drop(locks.lock("u2").await);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = KeyedLocks::shared();
        let held = locks.lock("u1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("u1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        assert!(locks.len() <= 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
