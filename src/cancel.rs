//! External cancellation signal for blocking waits.
//!
//! A [`CancelToken`] is cloned into every task that may need to abandon a
//! wait. Firing it wakes every thread currently parked in a wait that observes
//! the token; those waits return [`LockworkError::Cancelled`] without having
//! changed any shared state.
//!
//! [`LockworkError::Cancelled`]: crate::error::LockworkError::Cancelled

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

/// Cloneable cancellation signal shared between tasks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    parked: Mutex<Parked>,
}

#[derive(Debug, Default)]
struct Parked {
    next_id: u64,
    threads: Vec<(u64, Thread)>,
}

impl CancelToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token and wake every registered waiter.
    ///
    /// Firing is sticky: later waits observing this token fail immediately.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let threads = std::mem::take(&mut self.inner.parked.lock().threads);
        for (_, thread) in threads {
            thread.unpark();
        }
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register the calling thread to be unparked when the token fires.
    ///
    /// Must happen before the waiter's first cancellation check so a
    /// concurrent `cancel` is either observed by the check or unparks it.
    pub(crate) fn register(&self) -> Registration<'_> {
        let mut parked = self.inner.parked.lock();
        let id = parked.next_id;
        parked.next_id += 1;
        parked.threads.push((id, thread::current()));
        Registration { token: self, id }
    }

    #[cfg(test)]
    pub(crate) fn registered(&self) -> usize {
        self.inner.parked.lock().threads.len()
    }
}

/// RAII registration of a parked thread; deregisters on drop.
#[derive(Debug)]
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .parked
            .lock()
            .threads
            .retain(|(id, _)| *id != self.id);
    }
}
