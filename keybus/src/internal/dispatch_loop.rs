use std::{
    borrow::Cow,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use tokio::{select, sync::mpsc::Receiver};
use tokio_util::sync::CancellationToken;

use super::SubscriptionTable;
use crate::{Error, Event, Observe, Result, State};

/// Single consumer of the distributor's three inbound channels.
///
/// The loop is the only owner of the subscription table. Each iteration
/// handles exactly one message (an event, a registration or an
/// unregistration) or the stop signal. When several are ready at once,
/// `select!` picks one at random; nothing relies on a particular order
/// across channels.
pub(crate) struct DispatchLoop<E: Event> {
    name: Arc<str>,
    table: SubscriptionTable<E>,
    events: Receiver<E>,
    to_register: Receiver<Observe<E>>,
    to_unregister: Receiver<Observe<E>>,
    state: State,
}

impl<E: Event> DispatchLoop<E> {
    pub fn new(
        name: Arc<str>,
        events: Receiver<E>,
        to_register: Receiver<Observe<E>>,
        to_unregister: Receiver<Observe<E>>,
    ) -> Self {
        Self {
            name,
            table: SubscriptionTable::new(),
            events,
            to_register,
            to_unregister,
            state: State::Idle,
        }
    }

    /// Runs until `stop` is cancelled or the senders are gone.
    /// Messages still queued at that point are discarded.
    pub async fn run(&mut self, stop: CancellationToken) {
        self.state = State::Running;
        tracing::debug!(distributor = %self.name, "dispatch loop started");

        loop {
            select! {
                _ = stop.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => {
                        let _ = self.deliver(&event); // Failures are logged, never fatal
                    }
                    None => break,
                },
                observe = self.to_register.recv() => match observe {
                    Some(observe) => self.table.register(&observe),
                    None => break,
                },
                observe = self.to_unregister.recv() => match observe {
                    Some(observe) => {
                        let removed = self.table.unregister(&observe);
                        tracing::trace!(
                            distributor = %self.name,
                            uid = observe.observer().uid(),
                            removed,
                            "Observer unregistered"
                        );
                    }
                    None => break,
                },
            }
        }

        self.close();
    }

    /// Delivers one event to every observer under its key, in table order.
    /// Stops at the first failing observer. Returns the number of observers
    /// that handled the event successfully.
    pub fn deliver(&self, event: &E) -> Result<usize> {
        let key = match catch_unwind(AssertUnwindSafe(|| event.key())) {
            Ok(Ok(key)) => key,
            Ok(Err(e)) => {
                tracing::warn!(
                    distributor = %self.name,
                    event = %event_name(event),
                    error = %e,
                    "Dropping event without routing key"
                );
                return Err(e);
            }
            Err(_) => {
                tracing::error!(
                    distributor = %self.name,
                    event = %event_name(event),
                    "Key extraction panicked, dropping event"
                );
                return Err(Error::KeyExtraction("key extraction panicked".into()));
            }
        };

        let mut delivered = 0;
        for observer in self.table.observers(&key) {
            let result = match catch_unwind(AssertUnwindSafe(|| observer.handle_event(event))) {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        distributor = %self.name,
                        key = %key,
                        uid = observer.uid(),
                        "Observer panicked"
                    );
                    Err(Error::ObserverPanicked {
                        uid: observer.uid().into(),
                    })
                }
            };
            if let Err(e) = result {
                tracing::warn!(
                    distributor = %self.name,
                    key = %key,
                    uid = observer.uid(),
                    event = %event_name(event),
                    error = %e,
                    "Observer failed, skipping remaining observers"
                );
                return Err(e);
            }
            delivered += 1;
        }

        tracing::trace!(distributor = %self.name, key = %key, delivered, "Event delivered");
        Ok(delivered)
    }

    /// Closes all inbound channels. Safe to call more than once.
    fn close(&mut self) {
        if self.state == State::Stopped {
            return;
        }
        self.state = State::Stopped;

        self.events.close();
        self.to_register.close();
        self.to_unregister.close();

        tracing::debug!(
            distributor = %self.name,
            keys = self.table.len(),
            discarded_events = self.events.len(),
            discarded_registrations = self.to_register.len(),
            discarded_unregistrations = self.to_unregister.len(),
            "dispatch loop stopped"
        );
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &SubscriptionTable<E> {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> State {
        self.state
    }
}

/// Event name for log records; a panicking `name()` falls back to the type name.
fn event_name<E: Event>(event: &E) -> Cow<'static, str> {
    catch_unwind(AssertUnwindSafe(|| event.name()))
        .unwrap_or(Cow::Borrowed(std::any::type_name::<E>()))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc::{self, Sender};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{Key, Observer};

    struct Note(Option<&'static str>);

    impl Event for Note {
        fn key(&self) -> Result<Key> {
            if self.0 == Some("boom") {
                panic!("unreadable recipient");
            }
            self.0
                .map(Key::from)
                .ok_or_else(|| Error::KeyExtraction("note without recipient".into()))
        }
    }

    enum Behaviour {
        Ok,
        Fail,
        Panic,
    }

    struct Recorder {
        uid: &'static str,
        behaviour: Behaviour,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Observer<Note> for Recorder {
        fn handle_event(&self, event: &Note) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.uid, event.0.unwrap_or("-")));
            match self.behaviour {
                Behaviour::Ok => Ok(()),
                Behaviour::Fail => Err(Error::Handler("refused".into())),
                Behaviour::Panic => panic!("observer blew up"),
            }
        }

        fn uid(&self) -> &str {
            self.uid
        }
    }

    struct Fixture {
        dispatcher: DispatchLoop<Note>,
        events: Sender<Note>,
        to_register: Sender<Observe<Note>>,
        to_unregister: Sender<Observe<Note>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    fn fixture() -> Fixture {
        let (events, events_rx) = mpsc::channel(16);
        let (to_register, register_rx) = mpsc::channel(8);
        let (to_unregister, unregister_rx) = mpsc::channel(8);
        Fixture {
            dispatcher: DispatchLoop::new("test".into(), events_rx, register_rx, unregister_rx),
            events,
            to_register,
            to_unregister,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    impl Fixture {
        fn observe(&self, uid: &'static str, behaviour: Behaviour, keys: &[&str]) -> Observe<Note> {
            let observer = Recorder {
                uid,
                behaviour,
                log: self.log.clone(),
            };
            Observe::<Note>::new(Arc::new(observer), keys.iter().copied())
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_deliver_in_registration_order() {
        let mut f = fixture();
        let a = f.observe("a", Behaviour::Ok, &["k"]);
        let b = f.observe("b", Behaviour::Ok, &["k"]);
        f.dispatcher.table.register(&a);
        f.dispatcher.table.register(&b);

        assert_eq!(f.dispatcher.deliver(&Note(Some("k"))).unwrap(), 2);
        assert_eq!(f.log(), ["a:k", "b:k"]);
    }

    #[test]
    fn test_deliver_to_unknown_key() {
        let f = fixture();
        assert_eq!(f.dispatcher.deliver(&Note(Some("nobody"))).unwrap(), 0);
        assert!(f.log().is_empty());
    }

    #[test]
    fn test_failing_observer_short_circuits() {
        let mut f = fixture();
        for o in [
            f.observe("a", Behaviour::Ok, &["k"]),
            f.observe("b", Behaviour::Fail, &["k"]),
            f.observe("c", Behaviour::Ok, &["k"]),
        ] {
            f.dispatcher.table.register(&o);
        }

        let result = f.dispatcher.deliver(&Note(Some("k")));
        assert!(matches!(result, Err(Error::Handler(_))));
        assert_eq!(f.log(), ["a:k", "b:k"]);
    }

    #[test]
    fn test_panicking_observer_is_contained() {
        let mut f = fixture();
        f.dispatcher
            .table
            .register(&f.observe("boom", Behaviour::Panic, &["k"]));
        f.dispatcher
            .table
            .register(&f.observe("after", Behaviour::Ok, &["k"]));

        let result = f.dispatcher.deliver(&Note(Some("k")));
        assert!(matches!(result, Err(Error::ObserverPanicked { uid }) if &*uid == "boom"));
        assert_eq!(f.log(), ["boom:k"]);
    }

    #[test]
    fn test_event_without_key_is_dropped() {
        let mut f = fixture();
        f.dispatcher
            .table
            .register(&f.observe("a", Behaviour::Ok, &["k"]));
        let result = f.dispatcher.deliver(&Note(None));
        assert!(matches!(result, Err(Error::KeyExtraction(_))));
        assert!(f.log().is_empty());
    }

    #[test]
    fn test_panicking_key_extraction_is_contained() {
        let mut f = fixture();
        f.dispatcher
            .table
            .register(&f.observe("a", Behaviour::Ok, &["boom", "k"]));

        let result = f.dispatcher.deliver(&Note(Some("boom")));
        assert!(matches!(result, Err(Error::KeyExtraction(_))));
        assert!(f.log().is_empty());

        assert_eq!(f.dispatcher.deliver(&Note(Some("k"))).unwrap(), 1);
        assert_eq!(f.log(), ["a:k"]);
    }

    async fn drained<T>(tx: &Sender<T>) {
        while tx.capacity() < tx.max_capacity() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_run_applies_registrations() {
        let f = fixture();
        let stop = CancellationToken::new();
        let register = f.observe("a", Behaviour::Ok, &["x", "y"]);
        let unregister = f.observe("a", Behaviour::Ok, &["y"]);
        let Fixture {
            mut dispatcher,
            to_register,
            to_unregister,
            ..
        } = f;

        let loop_stop = stop.clone();
        let task = tokio::spawn(async move {
            dispatcher.run(loop_stop).await;
            dispatcher
        });

        to_register.send(register).await.unwrap();
        drained(&to_register).await;
        to_unregister.send(unregister).await.unwrap();
        drained(&to_unregister).await;

        stop.cancel();
        let dispatcher = task.await.unwrap();
        assert_eq!(dispatcher.state(), State::Stopped);
        assert!(dispatcher.table().contains_key(&Key::from("x")));
        assert!(!dispatcher.table().contains_key(&Key::from("y")));
    }

    #[tokio::test]
    async fn test_stop_closes_channels() {
        let mut f = fixture();
        let stop = CancellationToken::new();
        stop.cancel();
        f.dispatcher.run(stop).await;

        assert_eq!(f.dispatcher.state(), State::Stopped);
        assert!(f.events.is_closed());
        assert!(f.to_register.is_closed());
        assert!(f.to_unregister.is_closed());
        assert!(f.events.send(Note(Some("k"))).await.is_err());

        // A second close is harmless.
        f.dispatcher.close();
        assert_eq!(f.dispatcher.state(), State::Stopped);
    }

    #[tokio::test]
    async fn test_dropped_senders_end_the_loop() {
        let Fixture {
            mut dispatcher,
            events,
            to_register,
            to_unregister,
            ..
        } = fixture();
        drop((events, to_register, to_unregister));
        dispatcher.run(CancellationToken::new()).await;
        assert_eq!(dispatcher.state(), State::Stopped);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let mut f = fixture();
        let stop = CancellationToken::new();
        f.dispatcher
            .table
            .register(&f.observe("a", Behaviour::Fail, &["k"]));
        let Fixture {
            mut dispatcher,
            events,
            log,
            ..
        } = f;

        let loop_stop = stop.clone();
        let task = tokio::spawn(async move { dispatcher.run(loop_stop).await });

        events.send(Note(None)).await.unwrap();
        events.send(Note(Some("k"))).await.unwrap();
        events.send(Note(Some("k"))).await.unwrap();
        drained(&events).await;

        stop.cancel();
        task.await.unwrap();
        assert_eq!(*log.lock().unwrap(), ["a:k", "a:k"]);
    }
}
