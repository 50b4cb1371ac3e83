use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Handle returned by [`Distributor::start`](crate::Distributor::start).
///
/// - `stop()` asks the dispatch loop to terminate. Calling it again is a no-op.
/// - `join()` waits for the loop task to finish.
/// - Dropping the handle also stops the loop, so keep it alive for as long
///   as events should be distributed.
///
/// Stopping is cooperative: an observer that is currently handling an event
/// finishes before the loop notices the request. The stop signal is not
/// prioritised over queued messages either. The loop picks at random among
/// whatever is ready, so it may still apply a few queued events or
/// (un)registrations after `stop()` returns. Messages still queued once the
/// loop exits are discarded.
#[derive(Debug)]
pub struct StopHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StopHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    /// Request the dispatch loop to stop.
    #[inline]
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether a stop was requested (directly or through a parent token).
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the dispatch loop to exit.
    ///
    /// This does not request a stop on its own; use [`stop_and_join`]
    /// unless the loop is expected to end some other way.
    ///
    /// [`stop_and_join`]: StopHandle::stop_and_join
    pub async fn join(mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }

    /// Request a stop and wait for the loop to exit.
    pub async fn stop_and_join(self) -> Result<()> {
        self.stop();
        self.join().await
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
