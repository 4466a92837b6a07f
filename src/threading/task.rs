use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation flag shared between a submitted computation and its requester.
///
/// Cancelling is advisory: a computation that already started runs to the end,
/// but its result is dropped instead of being handed to the completion callback.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle {
    cancel: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
