//! Keybus - in-process keyed publish/subscribe for Tokio
//!
//! Producers publish events that know their own routing [`Key`]; observers
//! register interest in keys and get every matching event delivered, in
//! registration order. A single dispatch loop owns the subscription table
//! and serializes registrations, unregistrations and deliveries, so callers
//! on any number of tasks or threads never touch shared state directly.
//!
//! See `demos/hello-keys.rs`.

mod config;
mod distributor;
mod distributor_handle;
mod error;
mod event;
mod key;
mod observe;
mod observer;
mod state;
mod stop_handle;
mod uid;

mod internal;

pub use config::Config;
pub use distributor::Distributor;
pub use distributor_handle::DistributorHandle;
pub use error::Error;
pub use event::Event;
pub use key::Key;
pub use observe::Observe;
pub use observer::{Observer, SharedObserver};
pub use state::State;
pub use stop_handle::StopHandle;
pub use uid::Uid;

#[cfg(feature = "macros")]
pub use keybus_macros::Event;

pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::distributor::Distributor;
    pub use crate::error::Error as KeybusError;
    pub use crate::event::Event;
    pub use crate::key::Key;
    pub use crate::observe::Observe;
    pub use crate::observer::Observer;
    pub use crate::uid::Uid;
}
