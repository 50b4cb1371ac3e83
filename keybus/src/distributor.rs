use std::{ops::Deref, sync::Arc};

use tokio::sync::mpsc::channel;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, DistributorHandle, Error, Event, Observe, Result, State, StopHandle,
    internal::DispatchLoop,
};

/// Keyed publish/subscribe mediator.
///
/// A distributor owns three bounded channels (events, registrations,
/// unregistrations) and a dispatch loop that consumes them. The loop is the
/// only place the key to observers table lives, so no locking is involved:
/// every mutation and delivery is serialized through it.
///
/// - `new(name)` creates the channels. Messages sent before `start()` are
///   buffered (and callers wait once a buffer is full).
/// - `start()` spawns the loop on the current Tokio runtime and returns a
///   [`StopHandle`].
/// - Enqueue operations live on [`DistributorHandle`]; the distributor derefs
///   to one, and `handle()` gives a cloneable copy for other tasks.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use keybus::{Distributor, Event, Key, Observer, Result};
///
/// struct Greeting(&'static str);
///
/// impl Event for Greeting {
///     fn key(&self) -> Result<Key> {
///         Ok(Key::from(self.0))
///     }
/// }
///
/// struct Printer;
///
/// impl Observer<Greeting> for Printer {
///     fn handle_event(&self, event: &Greeting) -> Result<()> {
///         println!("hello, {}", event.0);
///         Ok(())
///     }
///
///     fn uid(&self) -> &str {
///         "printer"
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let mut distributor = Distributor::<Greeting>::new("greetings");
/// let stop = distributor.start()?;
///
/// distributor.register_observer(Arc::new(Printer), ["world"]).await?;
/// // Registrations and events travel on separate channels.
/// while distributor.pending_registrations() > 0 {
///     tokio::task::yield_now().await;
/// }
/// distributor.notify(Greeting("world")).await?;
///
/// stop.stop_and_join().await?;
/// # Ok(())
/// # }
/// ```
pub struct Distributor<E: Event> {
    handle: DistributorHandle<E>,
    config: Config,
    dispatcher: Option<DispatchLoop<E>>,
}

impl<E: Event> Distributor<E> {
    /// Create an idle distributor with the default [`Config`].
    pub fn new(name: &str) -> Self {
        let (handle, dispatcher) = Self::channels(Arc::from(name), &Config::default());
        Self {
            handle,
            config: Config::default(),
            dispatcher: Some(dispatcher),
        }
    }

    /// Create an idle distributor with custom channel capacities.
    pub fn with_config(name: &str, config: Config) -> Result<Self> {
        config.validate()?;
        let (handle, dispatcher) = Self::channels(Arc::from(name), &config);
        Ok(Self {
            handle,
            config,
            dispatcher: Some(dispatcher),
        })
    }

    fn channels(name: Arc<str>, config: &Config) -> (DistributorHandle<E>, DispatchLoop<E>) {
        let (events, events_rx) = channel::<E>(config.event_channel_size);
        let (to_register, register_rx) = channel::<Observe<E>>(config.registration_channel_size);
        let (to_unregister, unregister_rx) =
            channel::<Observe<E>>(config.unregistration_channel_size);

        let dispatcher = DispatchLoop::new(name.clone(), events_rx, register_rx, unregister_rx);
        let handle = DistributorHandle {
            name,
            events,
            to_register,
            to_unregister,
        };
        (handle, dispatcher)
    }

    /// Spawn the dispatch loop in a background task. Returns immediately.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStarted`] if the loop was started before.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn start(&mut self) -> Result<StopHandle> {
        self.spawn(CancellationToken::new())
    }

    /// Like [`start`](Self::start), but the loop also stops when `parent`
    /// is cancelled.
    pub fn start_with_cancellation(&mut self, parent: &CancellationToken) -> Result<StopHandle> {
        self.spawn(parent.child_token())
    }

    fn spawn(&mut self, token: CancellationToken) -> Result<StopHandle> {
        let mut dispatcher = self.dispatcher.take().ok_or(Error::AlreadyStarted)?;
        let stop = token.clone();
        let task = tokio::spawn(async move { dispatcher.run(stop).await });
        tracing::info!(distributor = %self.handle.name, "Distributor started");
        Ok(StopHandle::new(token, task))
    }

    /// A cloneable handle for publishing and (un)registering from other tasks.
    pub fn handle(&self) -> DistributorHandle<E> {
        self.handle.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> State {
        if self.dispatcher.is_some() {
            State::Idle
        } else if self.handle.is_closed() {
            State::Stopped
        } else {
            State::Running
        }
    }
}

impl<E: Event> Deref for Distributor<E> {
    type Target = DistributorHandle<E>;
    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::*;
    use crate::{Key, Observer};

    struct Tick(&'static str);

    impl Event for Tick {
        fn key(&self) -> Result<Key> {
            Ok(Key::from(self.0))
        }
    }

    struct Counter {
        seen: Mutex<Vec<&'static str>>,
    }

    impl Observer<Tick> for Counter {
        fn handle_event(&self, event: &Tick) -> Result<()> {
            self.seen.lock().unwrap().push(event.0);
            Ok(())
        }

        fn uid(&self) -> &str {
            "counter"
        }
    }

    async fn settle(handle: &DistributorHandle<Tick>) {
        while handle.pending_events() + handle.pending_registrations() > 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_lifecycle_states() {
        let mut distributor = Distributor::<Tick>::new("lifecycle");
        assert_eq!(distributor.state(), State::Idle);
        assert_eq!(distributor.name(), "lifecycle");

        let stop = distributor.start().unwrap();
        assert_eq!(distributor.state(), State::Running);

        stop.stop_and_join().await.unwrap();
        assert_eq!(distributor.state(), State::Stopped);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut distributor = Distributor::<Tick>::new("twice");
        let _stop = distributor.start().unwrap();
        assert!(matches!(distributor.start(), Err(Error::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let config = Config::default().with_event_channel_size(0);
        assert!(matches!(
            Distributor::<Tick>::with_config("bad", config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_messages_sent_before_start_are_buffered() {
        let mut distributor = Distributor::<Tick>::new("buffered");
        let counter = Arc::new(Counter {
            seen: Mutex::new(Vec::new()),
        });

        distributor
            .register_observer(counter.clone(), ["a"])
            .await
            .unwrap();
        assert_eq!(distributor.pending_registrations(), 1);

        let stop = distributor.start().unwrap();
        settle(&distributor).await;
        distributor.notify(Tick("a")).await.unwrap();
        settle(&distributor).await;

        assert_eq!(*counter.seen.lock().unwrap(), ["a"]);
        stop.stop_and_join().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_stop_handle_stops_loop() {
        let mut distributor = Distributor::<Tick>::new("dropped");
        drop(distributor.start().unwrap());

        tokio::time::timeout(Duration::from_secs(1), async {
            while !distributor.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(matches!(
            distributor.notify(Tick("a")).await,
            Err(Error::ChannelClosed("event"))
        ));
    }

    #[tokio::test]
    async fn test_parent_token_stops_loop() {
        let parent = CancellationToken::new();
        let mut distributor = Distributor::<Tick>::new("child");
        let stop = distributor.start_with_cancellation(&parent).unwrap();

        parent.cancel();
        assert!(stop.is_stopped());
        stop.join().await.unwrap();
        assert_eq!(distributor.state(), State::Stopped);
    }
}
