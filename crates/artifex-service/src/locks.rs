use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key, created on demand.
///
/// Holders of different keys never contend. Slots are kept only through weak
/// references, so a key's mutex is dropped as soon as no guard or waiter
/// holds it and the map never grows beyond the keys in flight.
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Weak<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.slot(key).lock_owned().await
    }

    fn slot(&self, key: &K) -> Arc<AsyncMutex<()>> {
        // The map is only touched in short, non-panicking sections, so a
        // poisoned guard still holds a consistent map.
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(slot) = slots.get(key).and_then(Weak::upgrade) {
            return slot;
        }
        slots.retain(|_, w| w.strong_count() > 0);
        let slot = Arc::new(AsyncMutex::new(()));
        slots.insert(key.clone(), Arc::downgrade(&slot));
        slot
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn live<K>(locks: &KeyedLocks<K>) -> usize {
        let slots = locks.slots.lock().unwrap();
        slots.values().filter(|w| w.strong_count() > 0).count()
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let (locks, inside, peak) = (locks.clone(), inside.clone(), peak.clone());
                tokio::spawn(async move {
                    let _guard = locks.lock(&"k".to_string()).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::<u32>::new();
        let _a = locks.lock(&1).await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.lock(&2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn slots_are_released() {
        let locks = KeyedLocks::<u32>::new();
        {
            let _a = locks.lock(&1).await;
            let _b = locks.lock(&2).await;
            assert_eq!(live(&locks), 2);
        }
        assert_eq!(live(&locks), 0);
        let _c = locks.lock(&3).await;
        assert_eq!(locks.slots.lock().unwrap().len(), 1);
    }
}
