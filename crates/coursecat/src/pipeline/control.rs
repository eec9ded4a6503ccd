use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle for a run.
///
/// Clones share the flag. The run loop checks it before each record.
#[derive(Debug, Clone, Default)]
pub struct RunController {
    cancelled: Arc<AtomicBool>,
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
