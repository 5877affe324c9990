//! In-process TTL cache with at-most-one in-flight computation per key

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::Result;

/// One key's slot. The `OnceCell` makes concurrent callers of the same
/// uncached key wait for the first computation instead of starting their own.
struct Slot<V> {
    cell: OnceCell<StoredEntry<V>>,
}

struct StoredEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cell
            .get()
            .is_some_and(|entry| entry.stored_at.elapsed() >= ttl)
    }
}

/// Keyed memoisation of expensive results, owned by the service that uses it
pub struct ResultCache<V> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Slot<V>>>>,
}

impl<V: Clone + Send + Sync + 'static> ResultCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot<V>>>> {
        // A poisoned map only means another caller panicked mid-insert; the map itself is intact.
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Slot for `key`, replacing it when the stored value has expired.
    /// Adding a new key also sweeps out every other expired slot.
    fn slot(&self, key: &str) -> Arc<Slot<V>> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(key).filter(|slot| !slot.is_expired(self.ttl)) {
            return Arc::clone(slot);
        }
        if !slots.contains_key(key) {
            slots.retain(|_, slot| !slot.is_expired(self.ttl));
        }
        let slot = Arc::new(Slot::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    /// Forget `slot` after a failed computation, unless it was replaced, got
    /// filled by a retrying waiter, or still has waiters that will retry
    fn release_failed(&self, key: &str, slot: &Arc<Slot<V>>) {
        let mut slots = self.slots();
        let abandoned = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot)
                && !slot.cell.initialized()
                && Arc::strong_count(slot) <= 2
        });
        if abandoned {
            slots.remove(key);
        }
    }

    /// Fresh cached value for `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots();
        let entry = slots.get(key)?.cell.get()?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.value.clone())
    }

    /// Return the cached value for `key`, or run `compute` and store its result.
    ///
    /// Concurrent callers for the same key share one computation. Errors are
    /// handed to the caller that ran the computation and are not stored, so the
    /// next waiter retries.
    #[tracing::instrument(name = "cache_get_or_compute", level = "debug", skip(self, compute))]
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let slot = self.slot(key);
        let mut computed = false;
        let ran = &mut computed;
        let entry = slot
            .cell
            .get_or_try_init(move || async move {
                *ran = true;
                let value = compute().await?;
                Ok::<_, crate::TowerIntelError>(StoredEntry {
                    value,
                    stored_at: Instant::now(),
                })
            })
            .await;

        match entry {
            Ok(entry) => {
                if computed {
                    tracing::debug!("Key computed and stored");
                } else {
                    tracing::debug!("Key found and still fresh");
                }
                Ok(entry.value.clone())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Computation failed, nothing cached");
                self.release_failed(key, &slot);
                Err(e)
            }
        }
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        let mut slots = self.slots();
        let dropped = slots.len();
        slots.clear();
        tracing::debug!(dropped, "Cache invalidated");
    }

    /// Remove expired entries; returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_expired(self.ttl));
        before - slots.len()
    }

    /// Number of stored values, fresh or expired
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.cell.initialized())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots().len()
    }
}
