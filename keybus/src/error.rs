use std::sync::Arc;

use tokio::sync::mpsc::error::SendError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Event has no routing key: {0}")]
    KeyExtraction(Arc<str>),

    #[error("Observer failed to handle the event: {0}")]
    Handler(Arc<str>),

    #[error("Observer '{uid}' panicked while handling an event")]
    ObserverPanicked { uid: Arc<str> },

    #[error("The {0} channel is closed; the distributor has stopped.")]
    ChannelClosed(&'static str),

    #[error("Distributor has already started.")]
    AlreadyStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Dispatch loop join error: {0}")]
    LoopJoin(#[from] tokio::task::JoinError),

    #[error("Error external to keybus occurred: {0}")]
    External(Arc<str>),
}

impl Error {
    /// Wraps any displayable error as [`Error::External`].
    ///
    /// Handy inside [`Observer::handle_event`](crate::Observer::handle_event)
    /// when forwarding failures from other libraries.
    pub fn external(e: impl std::fmt::Display) -> Self {
        Error::External(e.to_string().into())
    }

    pub(crate) fn closed<T>(channel: &'static str) -> impl FnOnce(SendError<T>) -> Error {
        move |_| Error::ChannelClosed(channel)
    }
}
