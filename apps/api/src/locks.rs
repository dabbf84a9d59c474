//! Keyed async mutex table.
//!
//! One FIFO-fair `tokio::sync::Mutex` per key, created on first use and
//! dropped once nobody holds or waits on it. Callers for the same key run one
//! at a time in arrival order; callers for different keys never contend
//! beyond the brief table lookup.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus queued waiters.
    users: usize,
}

type Slots<K> = Arc<Mutex<HashMap<K, Slot>>>;

pub struct KeyedLocks<K> {
    slots: Slots<K>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. Access is released when the
    /// returned guard is dropped. Dropping the future while it waits gives up
    /// its place in the queue.
    pub async fn acquire(&self, key: K) -> KeyGuard<K> {
        let (registration, mutex) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            let registration = Registration {
                key,
                slots: Arc::clone(&self.slots),
            };
            (registration, Arc::clone(&slot.mutex))
        };
        let guard = mutex.lock_owned().await;
        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys currently held or awaited.
    #[cfg(test)]
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One counted user of a slot, from the moment it queues until it releases
/// or is cancelled. The last one out removes the slot.
struct Registration<K: Eq + Hash> {
    key: K,
    slots: Slots<K>,
}

impl<K: Eq + Hash> Drop for Registration<K> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Fields drop in order: the mutex is unlocked before the slot is released.
pub struct KeyGuard<K: Eq + Hash> {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<K>,
}
