use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key locks for requests that are currently in flight.
///
/// Callers holding the guard for a key run alone; everyone else asking for the
/// same key waits. A key's lock disappears once nobody holds or awaits it.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Weak<Mutex<()>>>>>,
}

impl KeyedLocks {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `key`, then holds it until the guard drops
    pub async fn lock(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(&key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(key, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of keys currently held or awaited
    pub async fn in_flight(&self) -> usize {
        let locks = self.locks.lock().await;
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
