use std::sync::Arc;

use keybus::*;

#[derive(Event, Debug)]
struct Notification {
    #[key]
    username: String,
}

struct Client {
    destination: &'static str,
}

impl Observer<Notification> for Client {
    fn handle_event(&self, event: &Notification) -> Result<()> {
        println!("Client: {} received: {}", self.destination, event.username);
        Ok(())
    }

    fn uid(&self) -> &str {
        self.destination
    }
}

async fn settle(handle: &DistributorHandle<Notification>) {
    while handle.pending_events() + handle.pending_registrations() > 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut distributor = Distributor::<Notification>::new("myDistributor");
    let stop = distributor.start()?;

    distributor
        .register_observers([
            Observe::<Notification>::new(
                Arc::new(Client {
                    destination: "127.0.0.1",
                }),
                ["bob", "alice"],
            ),
            Observe::<Notification>::new(
                Arc::new(Client {
                    destination: "127.0.0.2",
                }),
                ["alice"],
            ),
        ])
        .await?;
    // Registrations and events travel on separate channels.
    settle(&distributor).await;

    distributor
        .notify_observers(["bob", "alice"].map(|name| Notification {
            username: name.into(),
        }))
        .await?;
    settle(&distributor).await;

    // Prints:
    // Client: 127.0.0.1 received: bob
    // Client: 127.0.0.1 received: alice
    // Client: 127.0.0.2 received: alice
    stop.stop_and_join().await
}
