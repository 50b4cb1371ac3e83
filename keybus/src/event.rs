use std::borrow::Cow;

use crate::{Key, Result};

/// Capability implemented by every value published through a distributor.
///
/// An event only has to know which [`Key`] it should be routed by. Events are
/// moved into the distributor's queue and dropped once the dispatch loop has
/// offered them to every observer under that key, so they must be
/// `Send + 'static`.
///
/// Returning an error from [`key`](Event::key) drops the event: it is logged
/// and no observer sees it.
///
/// # Event Names
///
/// The `name()` method returns a human-readable name used in log records.
/// The default implementation returns the full type name via
/// `std::any::type_name`.
///
/// With the `macros` feature, `#[derive(Event)]` on a struct takes the key
/// from the field marked `#[key]`:
///
/// ```rust
/// use keybus::Event;
///
/// #[derive(Event)]
/// struct Notification {
///     #[key]
///     username: String,
/// }
///
/// let n = Notification { username: "bob".into() };
/// assert_eq!(n.key().unwrap().as_str(), "bob");
/// ```
pub trait Event: Send + 'static {
    /// Resolves the key this event is routed by.
    fn key(&self) -> Result<Key>;

    /// Returns a human-readable name for this event.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}
