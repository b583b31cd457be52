//! Wait budgets for blocking calls.
//!
//! Every blocking operation in lockwork takes a [`Wait`]: an optional absolute
//! deadline on the monotonic clock plus an optional [`CancelToken`]. Blocked
//! threads park (no spinning) and re-check their wake-up predicate every time
//! they are unparked, so spurious wake-ups are harmless.

use crate::cancel::{CancelToken, Registration};
use crate::error::{LockworkError, Result};
use parking_lot::Mutex;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

/// Deadline and cancellation source for one blocking call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait<'a> {
    deadline: Option<Instant>,
    cancel: Option<&'a CancelToken>,
}

impl Wait<'static> {
    /// Wait with no deadline and no cancellation source.
    pub fn forever() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    /// Wait at most `timeout`, measured from now.
    ///
    /// A timeout too large to represent as an `Instant` waits forever.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancel: None,
        }
    }

    /// Wait until `deadline`.
    pub fn until(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }
}

impl<'a> Wait<'a> {
    /// Also abandon the wait when `token` fires.
    pub fn cancel_on<'b>(self, token: &'b CancelToken) -> Wait<'b>
    where
        'a: 'b,
    {
        Wait {
            deadline: self.deadline,
            cancel: Some(token),
        }
    }

    /// The absolute deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the wait can end without the awaited condition.
    pub fn is_bounded(&self) -> bool {
        self.deadline.is_some() || self.cancel.is_some()
    }

    /// Fail if the wait is over. Cancellation is reported ahead of expiry.
    pub(crate) fn check(&self) -> Result<()> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(LockworkError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(LockworkError::TimedOut),
            _ => Ok(()),
        }
    }

    pub(crate) fn register(&self) -> Option<Registration<'a>> {
        self.cancel.map(CancelToken::register)
    }

    /// Park until unparked, or until the deadline passes.
    pub(crate) fn park(&self) {
        match self.remaining() {
            Some(remaining) if remaining.is_zero() => {}
            Some(remaining) => thread::park_timeout(remaining),
            None => thread::park(),
        }
    }
}

/// Park the calling thread until `poll` succeeds or `wait` is over.
///
/// `poll` runs with `state` locked each time the thread wakes. When the wait
/// ends first, `abandon` runs under the same lock to undo the caller's queue
/// entry and returns the threads that must be woken as a consequence.
pub(crate) fn park_until<S, P, A, W>(
    state: &Mutex<S>,
    wait: &Wait<'_>,
    mut poll: P,
    abandon: A,
) -> Result<()>
where
    P: FnMut(&mut S) -> bool,
    A: FnOnce(&mut S) -> W,
    W: IntoIterator<Item = Thread>,
{
    let _registration = wait.register();
    loop {
        let mut guard = state.lock();
        if poll(&mut *guard) {
            return Ok(());
        }
        if let Err(err) = wait.check() {
            let wake: Vec<Thread> = abandon(&mut *guard).into_iter().collect();
            drop(guard);
            for thread in wake {
                thread.unpark();
            }
            return Err(err);
        }
        drop(guard);
        wait.park();
    }
}
