//! Run progress broadcaster for real-time progress streaming.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::pipeline::progress::{ProgressReporter, ProgressSnapshot};

/// Fans progress snapshots out to any number of subscribers.
///
/// Sending never blocks; slow subscribers observe `Lagged` instead.
#[derive(Clone)]
pub struct RunProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProgressSnapshot>>,
}

impl RunProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a snapshot to all subscribers.
    pub fn send(&self, snapshot: ProgressSnapshot) {
        // No active receivers is fine
        let _ = self.sender.send(snapshot);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressSnapshot> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RunProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressReporter for RunProgressBroadcaster {
    fn report(&self, snapshot: ProgressSnapshot) {
        self.send(snapshot);
    }
}
