use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// FIFO of finished work waiting for the consumer thread.
///
/// Workers push from any thread; the consumer takes the whole backlog in one
/// lock acquisition and processes it after the lock is released, so a slow
/// callback never blocks a worker trying to enqueue.
pub struct CompletionQueue<P> {
    inner: Arc<Mutex<VecDeque<P>>>,
}

impl<P> CompletionQueue<P> {
    pub fn new() -> Self {
        CompletionQueue {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, item: P) {
        self.lock().push_back(item);
    }

    /// Removes and returns everything queued so far, oldest first.
    pub fn take_all(&self) -> VecDeque<P> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A worker that panicked while holding the lock cannot leave the deque half
    // written (push_back is the only mutation), so the data is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<P>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P> Clone for CompletionQueue<P> {
    fn clone(&self) -> Self {
        CompletionQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for CompletionQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}
