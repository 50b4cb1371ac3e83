use std::fmt;

use crate::{Event, Key, SharedObserver};

/// Pairing of one observer with the keys it should (un)subscribe from.
///
/// Used as the payload of registration and unregistration requests. The
/// record itself is consumed by the dispatch loop; only the observer
/// reference is kept in the subscription table.
pub struct Observe<E: Event> {
    pub(crate) observer: SharedObserver<E>,
    pub(crate) keys: Vec<Key>,
}

impl<E: Event> Observe<E> {
    pub fn new<I, K>(observer: SharedObserver<E>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            observer,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn observer(&self) -> &SharedObserver<E> {
        &self.observer
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl<E: Event> Clone for Observe<E> {
    fn clone(&self) -> Self {
        Self {
            observer: self.observer.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<E: Event> fmt::Debug for Observe<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observe")
            .field("observer", &self.observer.uid())
            .field("keys", &self.keys)
            .finish()
    }
}
