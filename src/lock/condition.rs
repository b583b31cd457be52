//! Named wait-conditions bound to a [`Lock`].

use super::{Guard, Lock, LockId};
use crate::error::{LockworkError, Result};
use crate::wait::Wait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::thread::{self, Thread};

/// A wait-condition associated with one [`Lock`].
///
/// Waiting fully releases the lock, blocks until signalled, then reacquires
/// the lock with its previous hold count before returning. A return does not
/// mean the awaited predicate holds: callers always re-check it in a loop.
#[derive(Debug)]
pub struct Condition {
    lock_id: LockId,
    lock_name: String,
    state: Mutex<ConditionState>,
}

#[derive(Debug, Default)]
struct ConditionState {
    next_ticket: u64,
    waiters: VecDeque<ConditionWaiter>,
}

#[derive(Debug)]
struct ConditionWaiter {
    ticket: u64,
    thread: Thread,
    signalled: bool,
}

impl ConditionState {
    /// Remove the waiter, reporting whether it had been signalled.
    fn take(&mut self, ticket: u64) -> bool {
        match self.waiters.iter().position(|w| w.ticket == ticket) {
            Some(index) => self
                .waiters
                .remove(index)
                .is_some_and(|waiter| waiter.signalled),
            None => false,
        }
    }

    fn is_signalled(&self, ticket: u64) -> bool {
        self.waiters
            .iter()
            .any(|w| w.ticket == ticket && w.signalled)
    }
}

impl Condition {
    pub(crate) fn new(lock_id: LockId, lock_name: &str) -> Self {
        Self {
            lock_id,
            lock_name: lock_name.to_string(),
            state: Mutex::new(ConditionState::default()),
        }
    }

    /// Identity of the lock this condition belongs to.
    pub fn lock_id(&self) -> LockId {
        self.lock_id
    }

    /// Number of tasks waiting and not yet signalled.
    pub fn waiters(&self) -> usize {
        self.state
            .lock()
            .waiters
            .iter()
            .filter(|w| !w.signalled)
            .count()
    }

    /// Wait for a signal within `wait`.
    ///
    /// `guard` must be a live guard of the bound lock, otherwise
    /// [`LockworkError::NotOwner`] is returned without waiting. On every
    /// return, including `TimedOut` and `Cancelled`, the lock is held again.
    /// A signal that races with expiry or cancellation wins.
    pub fn wait(&self, guard: &mut Guard<'_, Lock>, wait: &Wait<'_>) -> Result<()> {
        let lock = guard.lock();
        if lock.id() != self.lock_id || guard.is_released() {
            return Err(LockworkError::NotOwner {
                lock: self.lock_name.clone(),
            });
        }

        let _registration = wait.register();
        let ticket = {
            let mut state = self.state.lock();
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            state.waiters.push_back(ConditionWaiter {
                ticket,
                thread: thread::current(),
                signalled: false,
            });
            ticket
        };

        let holds = match lock.release_all() {
            Ok(holds) => holds,
            Err(err) => {
                self.state.lock().take(ticket);
                return Err(err);
            }
        };
        let outcome = self.block(ticket, wait);
        lock.reacquire(holds);
        outcome
    }

    fn block(&self, ticket: u64, wait: &Wait<'_>) -> Result<()> {
        loop {
            {
                let mut state = self.state.lock();
                if state.is_signalled(ticket) {
                    state.take(ticket);
                    return Ok(());
                }
                if let Err(err) = wait.check() {
                    state.take(ticket);
                    return Err(err);
                }
            }
            wait.park();
        }
    }

    /// Wake the longest-waiting task, if any.
    pub fn signal(&self) {
        let thread = {
            let mut state = self.state.lock();
            state
                .waiters
                .iter_mut()
                .find(|w| !w.signalled)
                .map(|waiter| {
                    waiter.signalled = true;
                    waiter.thread.clone()
                })
        };
        if let Some(thread) = thread {
            thread.unpark();
        }
    }

    /// Wake every waiting task.
    pub fn signal_all(&self) {
        let threads: Vec<Thread> = {
            let mut state = self.state.lock();
            state
                .waiters
                .iter_mut()
                .filter(|w| !w.signalled)
                .map(|waiter| {
                    waiter.signalled = true;
                    waiter.thread.clone()
                })
                .collect()
        };
        for thread in threads {
            thread.unpark();
        }
    }
}
