use crate::{Error, Result};

/// Channel capacities for a [`Distributor`](crate::Distributor).
///
/// The capacities are the distributor's only backpressure mechanism: once a
/// queue is full, callers wait until the dispatch loop makes room.
///
/// # Examples
///
/// ```rust
/// use keybus::Config;
///
/// let config = Config::default()
///     .with_event_channel_size(4096)     // Bursty producers
///     .with_registration_channel_size(32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of events that can be queued before `notify` waits.
    /// Default: 1024
    pub event_channel_size: usize,

    /// Number of pending registrations before `register_observer` waits.
    /// Default: 8
    pub registration_channel_size: usize,

    /// Number of pending unregistrations before `unregister_observer` waits.
    /// Default: 8
    pub unregistration_channel_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            event_channel_size: 1024,
            registration_channel_size: 8,
            unregistration_channel_size: 8,
        }
    }
}

impl Config {
    pub fn with_event_channel_size(mut self, size: usize) -> Self {
        self.event_channel_size = size;
        self
    }

    pub fn with_registration_channel_size(mut self, size: usize) -> Self {
        self.registration_channel_size = size;
        self
    }

    pub fn with_unregistration_channel_size(mut self, size: usize) -> Self {
        self.unregistration_channel_size = size;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.event_channel_size == 0 {
            return Err(Error::InvalidConfig("event channel size must be positive"));
        }
        if self.registration_channel_size == 0 {
            return Err(Error::InvalidConfig(
                "registration channel size must be positive",
            ));
        }
        if self.unregistration_channel_size == 0 {
            return Err(Error::InvalidConfig(
                "unregistration channel size must be positive",
            ));
        }
        Ok(())
    }
}
