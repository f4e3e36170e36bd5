use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a running live-feed session.
///
/// A session is a task forwarding feed points until it sees the stop signal
/// or its source closes. Dropping the handle sends the stop signal and aborts
/// a session that is still running; [`FeedHandle::stop`] sends the signal and
/// waits for the session to wind down on its own.
#[derive(Debug)]
pub struct FeedHandle {
    session: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl FeedHandle {
    /// Wrap a session task and its stop signal.
    #[must_use]
    pub const fn new(session: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            session: Some(session),
            stop_tx: Some(stop_tx),
        }
    }

    /// Request shutdown and wait for the session task to finish.
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(session) = self.session.take() {
            let _ = session.await;
        }
    }

    /// Whether the session task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // session already gone
            let _ = tx.send(());
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(session) = self.session.take().filter(|s| !s.is_finished()) {
            session.abort();
        }
    }
}
