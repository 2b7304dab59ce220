//! Progress delivery between a worker task and its consumer.
//!
//! Workers push into an unbounded queue so no event is ever dropped on a
//! slow consumer. Heartbeats are synthesized here, on the consumer side,
//! so a worker blocked in a long service call still produces signs of
//! life downstream.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::events::ProgressEvent;

/// Build a progress channel with the given consumer poll window.
pub(crate) fn progress_channel(
    poll: Duration,
) -> (mpsc::UnboundedSender<ProgressEvent>, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ProgressReceiver { rx, poll })
}

/// Consumer half of a worker's progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
    poll: Duration,
}

impl ProgressReceiver {
    /// Next event. `None` once the worker is gone and the queue drained.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Next event, or a synthetic heartbeat when the poll window passes
    /// with nothing to deliver. `None` still means the channel closed.
    pub async fn next_or_heartbeat(&mut self) -> Option<ProgressEvent> {
        match timeout(self.poll, self.rx.recv()).await {
            Ok(event) => event,
            Err(_) => Some(ProgressEvent::heartbeat()),
        }
    }

    /// The configured quiet window.
    pub fn poll_timeout(&self) -> Duration {
        self.poll
    }
}
