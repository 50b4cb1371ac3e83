use std::sync::Arc;

use crate::{Event, Result};

/// Shared reference to an observer, as kept by the subscription table.
pub type SharedObserver<E> = Arc<dyn Observer<E>>;

/// Subscriber capable of handling events delivered by a
/// [`Distributor`](crate::Distributor).
///
/// Handlers run synchronously inside the dispatch loop, one event at a time,
/// in registration order. A slow handler delays every other delivery, so
/// offload heavy work (e.g. by forwarding the event into your own channel).
///
/// Returning an error stops delivery of the current event to the observers
/// registered after this one under the same key. The loop itself keeps
/// running. A panicking handler is treated the same way.
///
/// [`uid`](Observer::uid) must be stable for the lifetime of the observer;
/// it is the only thing compared when unregistering.
///
/// # Example
///
/// ```rust
/// use keybus::{Event, Key, Observer, Result, Uid};
///
/// struct Notification(String);
///
/// impl Event for Notification {
///     fn key(&self) -> Result<Key> {
///         Ok(Key::from(&self.0))
///     }
/// }
///
/// struct Printer {
///     id: Uid,
/// }
///
/// impl Observer<Notification> for Printer {
///     fn handle_event(&self, event: &Notification) -> Result<()> {
///         println!("received: {}", event.0);
///         Ok(())
///     }
///
///     fn uid(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Observer<E: Event>: Send + Sync + 'static {
    /// Handle a single delivered event.
    fn handle_event(&self, event: &E) -> Result<()>;

    /// Stable identifier used to match this observer on unregistration.
    fn uid(&self) -> &str;
}
