//! Per-key single-flight cache shared by the component registry and the
//! template store.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot<T> = Arc<OnceCell<Arc<T>>>;

pub(crate) struct SingleFlight<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SingleFlight<T> {
    /// The value for `key`, running `load` if nobody has stored one yet.
    ///
    /// Concurrent callers for the same key wait on a single `load`. When it
    /// fails, the empty slot is dropped so misses do not accumulate.
    pub(crate) fn get_or_try_load<E>(
        &self,
        key: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let slot = Arc::clone(self.lock().entry(key.to_string()).or_default());
        let result = slot.get_or_try_init(|| load().map(Arc::new)).cloned();
        if result.is_err() {
            let mut slots = self.lock();
            if slots
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &slot) && current.get().is_none())
            {
                slots.remove(key);
            }
        }
        result
    }

    /// Number of stored values.
    pub(crate) fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    /// Number of keys with a slot, filled or not.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_loads_leave_no_slot() {
        let cache: SingleFlight<String> = SingleFlight::default();
        for key in ["a", "b", "c"] {
            assert!(cache.get_or_try_load(key, || Err::<String, _>("missing")).is_err());
        }
        assert_eq!(cache.slot_count(), 0);

        let value = cache.get_or_try_load("a", || Ok::<_, ()>("ok".to_string())).unwrap();
        assert_eq!(*value, "ok");
        assert_eq!(cache.slot_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stored_values_are_not_reloaded() {
        let cache: SingleFlight<u32> = SingleFlight::default();
        let first = cache.get_or_try_load("k", || Ok::<_, ()>(1)).unwrap();
        let second = cache.get_or_try_load("k", || Ok::<_, ()>(2)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }
}
