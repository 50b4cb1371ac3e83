use std::collections::HashMap;

use crate::{Event, Key, Observe, SharedObserver};

/// Key to observers mapping owned exclusively by the dispatch loop.
///
/// Invariant: every key present maps to a non-empty list. Observers under a
/// key are kept in registration order until the first removal; removal swaps
/// the last entry into the freed slot.
pub(crate) struct SubscriptionTable<E: Event> {
    observers: HashMap<Key, Vec<SharedObserver<E>>>,
}

impl<E: Event> SubscriptionTable<E> {
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
        }
    }

    /// Appends the observer under every key of the record.
    /// Registering the same observer twice under a key is not deduplicated.
    pub fn register(&mut self, observe: &Observe<E>) {
        for key in &observe.keys {
            self.observers
                .entry(key.clone())
                .or_default()
                .push(observe.observer.clone());
        }
    }

    /// Removes the first observer with a matching uid under every key of the
    /// record. Keys left without observers are dropped. Returns how many
    /// relations were removed.
    pub fn unregister(&mut self, observe: &Observe<E>) -> usize {
        let uid = observe.observer.uid();
        let mut removed = 0;
        for key in &observe.keys {
            let Some(list) = self.observers.get_mut(key) else {
                continue;
            };
            if let Some(idx) = list.iter().position(|o| o.uid() == uid) {
                list.swap_remove(idx);
                removed += 1;
            }
            if list.is_empty() {
                self.observers.remove(key);
            }
        }
        removed
    }

    pub fn observers(&self, key: &Key) -> &[SharedObserver<E>] {
        self.observers.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.observers.contains_key(key)
    }

    /// Number of keys with at least one observer.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
