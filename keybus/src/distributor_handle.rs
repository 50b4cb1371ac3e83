use std::{fmt, sync::Arc};

use tokio::sync::mpsc::Sender;

use crate::{Error, Event, Key, Observe, Result, SharedObserver};

/// Cloneable entry point for publishing events and (un)registering observers.
///
/// Obtained from [`Distributor::handle`](crate::Distributor::handle); a
/// [`Distributor`](crate::Distributor) also derefs to its handle. Handles are
/// `Send + Sync` and cheap to clone, so any number of tasks or threads can
/// use them concurrently.
///
/// Every operation only enqueues a message for the dispatch loop:
/// - Messages on the same channel are applied in send order.
/// - There is no ordering across channels: a registration sent right before
///   an event may be applied after that event is delivered.
/// - When a channel is full the caller waits (async) or blocks (`blocking_*`)
///   until the loop makes room.
/// - Once the loop has stopped, every operation returns
///   [`Error::ChannelClosed`].
pub struct DistributorHandle<E: Event> {
    pub(crate) name: Arc<str>,
    pub(crate) events: Sender<E>,
    pub(crate) to_register: Sender<Observe<E>>,
    pub(crate) to_unregister: Sender<Observe<E>>,
}

impl<E: Event> DistributorHandle<E> {
    /// The distributor's name. Descriptive only; used in log records.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribe `observer` to every key in `keys`.
    pub async fn register_observer<I, K>(
        &self,
        observer: SharedObserver<E>,
        keys: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.to_register
            .send(Observe::new(observer, keys))
            .await
            .map_err(Error::closed("registration"))
    }

    /// Remove `observer` (matched by uid) from every key in `keys`.
    /// Keys it was never registered under are ignored.
    pub async fn unregister_observer<I, K>(
        &self,
        observer: SharedObserver<E>,
        keys: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.to_unregister
            .send(Observe::new(observer, keys))
            .await
            .map_err(Error::closed("unregistration"))
    }

    /// Enqueue several registrations, one message per record.
    ///
    /// Not atomic: registrations from other callers may interleave.
    pub async fn register_observers(
        &self,
        observes: impl IntoIterator<Item = Observe<E>>,
    ) -> Result<()> {
        for observe in observes {
            self.to_register
                .send(observe)
                .await
                .map_err(Error::closed("registration"))?;
        }
        Ok(())
    }

    /// Enqueue several unregistrations, one message per record.
    pub async fn unregister_observers(
        &self,
        observes: impl IntoIterator<Item = Observe<E>>,
    ) -> Result<()> {
        for observe in observes {
            self.to_unregister
                .send(observe)
                .await
                .map_err(Error::closed("unregistration"))?;
        }
        Ok(())
    }

    /// Publish a single event.
    pub async fn notify(&self, event: E) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(Error::closed("event"))
    }

    /// Publish events one by one, in iteration order.
    ///
    /// Fire-and-forget: `Ok` means the events were queued, not delivered.
    pub async fn notify_observers(&self, events: impl IntoIterator<Item = E>) -> Result<()> {
        for event in events {
            self.notify(event).await?;
        }
        Ok(())
    }

    /// Blocking variant of [`register_observer`](Self::register_observer)
    /// for synchronous threads.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_register_observer<I, K>(
        &self,
        observer: SharedObserver<E>,
        keys: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.to_register
            .blocking_send(Observe::new(observer, keys))
            .map_err(Error::closed("registration"))
    }

    /// Blocking variant of [`unregister_observer`](Self::unregister_observer).
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_unregister_observer<I, K>(
        &self,
        observer: SharedObserver<E>,
        keys: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.to_unregister
            .blocking_send(Observe::new(observer, keys))
            .map_err(Error::closed("unregistration"))
    }

    /// Blocking variant of [`notify_observers`](Self::notify_observers).
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_notify_observers(&self, events: impl IntoIterator<Item = E>) -> Result<()> {
        for event in events {
            self.events
                .blocking_send(event)
                .map_err(Error::closed("event"))?;
        }
        Ok(())
    }

    /// Events queued but not yet taken by the dispatch loop.
    pub fn pending_events(&self) -> usize {
        pending(&self.events)
    }

    /// Registrations queued but not yet applied.
    pub fn pending_registrations(&self) -> usize {
        pending(&self.to_register)
    }

    /// Unregistrations queued but not yet applied.
    pub fn pending_unregistrations(&self) -> usize {
        pending(&self.to_unregister)
    }

    /// Whether the dispatch loop has stopped and closed its channels.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

fn pending<T>(sender: &Sender<T>) -> usize {
    if sender.is_closed() {
        return 0;
    }
    sender.max_capacity() - sender.capacity()
}

impl<E: Event> Clone for DistributorHandle<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            events: self.events.clone(),
            to_register: self.to_register.clone(),
            to_unregister: self.to_unregister.clone(),
        }
    }
}

impl<E: Event> fmt::Debug for DistributorHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributorHandle")
            .field("name", &self.name)
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}
