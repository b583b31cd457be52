//! Reentrant exclusive lock with configurable fairness.
//!
//! This module implements the explicit lock that replaces a per-object
//! monitor:
//! - Blocking, bounded (timeout) and non-blocking acquisition
//! - Cancellation through a [`CancelToken`](crate::cancel::CancelToken)
//! - Reentrancy tracked by a hold count
//! - Named wait-conditions ([`Condition`])
//!
//! # Fairness
//!
//! Under [`Fairness::Fifo`] a released lock is handed directly to the
//! longest-waiting task, so a concurrent `try_acquire` can never jump the
//! queue. Under [`Fairness::Unordered`] any task that finds the lock free may
//! take it, including a fresh `try_acquire` arriving while others are queued.
//! That trades starvation-freedom for throughput: an unordered lock makes no
//! promise that a waiter is ever served.
//!
//! # RAII Guards
//!
//! Every acquisition returns a [`Guard`] that releases on drop, on every exit
//! path. Guards are `!Send`; the owning thread is the one that acquired.

mod condition;
mod guard;
mod state;


pub use condition::Condition;
pub use guard::{Guard, RawLock};

use crate::error::{LockworkError, Result};
use crate::wait::{self, Wait};
use parking_lot::Mutex;
use state::LockState;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

/// Process-unique lock identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockId(u64);

impl LockId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LockId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order in which blocked tasks are granted a released lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fairness {
    /// Strict arrival order among blocked tasks.
    #[default]
    Fifo,
    /// Whoever gets there first; starvation is possible.
    Unordered,
}

impl From<bool> for Fairness {
    /// `true` selects [`Fairness::Fifo`].
    fn from(fair: bool) -> Self {
        if fair {
            Fairness::Fifo
        } else {
            Fairness::Unordered
        }
    }
}

impl fmt::Display for Fairness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fairness::Fifo => write!(f, "fifo"),
            Fairness::Unordered => write!(f, "unordered"),
        }
    }
}

/// An exclusive, reentrant lock.
#[derive(Debug)]
pub struct Lock {
    id: LockId,
    name: String,
    fairness: Fairness,
    state: Mutex<LockState>,
}

impl Lock {
    /// Create an unlocked lock. `Lock::new(true)` is FIFO-fair.
    pub fn new(fairness: impl Into<Fairness>) -> Self {
        let id = LockId::next();
        Self {
            id,
            name: format!("lock{}", id),
            fairness: fairness.into(),
            state: Mutex::new(LockState::default()),
        }
    }

    /// Create a FIFO-fair lock.
    pub fn fair() -> Self {
        Self::new(Fairness::Fifo)
    }

    /// Create an unordered (barging) lock.
    pub fn unfair() -> Self {
        Self::new(Fairness::Unordered)
    }

    /// Set the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> LockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fairness(&self) -> Fairness {
        self.fairness
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    /// Current owner, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        self.state.lock().owner
    }

    /// Unmatched acquisitions by the current owner (0 when free).
    pub fn hold_count(&self) -> usize {
        self.state.lock().hold_count
    }

    /// Number of tasks blocked waiting for the lock.
    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Create a wait-condition bound to this lock.
    pub fn new_condition(&self) -> Condition {
        Condition::new(self.id, &self.name)
    }

    /// Undo one acquisition made by the calling thread.
    ///
    /// This is the manual counterpart of dropping a [`Guard`]; pair it with
    /// [`Guard::forget`]. Returns [`LockworkError::NotOwner`] when the calling
    /// thread does not hold the lock.
    pub fn release(&self) -> Result<()> {
        let next = {
            let mut state = self.state.lock();
            self.check_owner(&state)?;
            state.release_one(self.fairness)
        };
        if let Some(thread) = next {
            thread.unpark();
        }
        Ok(())
    }

    /// Fully release the lock, returning the hold count to restore later.
    pub(crate) fn release_all(&self) -> Result<usize> {
        let (holds, next) = {
            let mut state = self.state.lock();
            self.check_owner(&state)?;
            let holds = state.hold_count;
            state.hold_count = 1;
            (holds, state.release_one(self.fairness))
        };
        if let Some(thread) = next {
            thread.unpark();
        }
        Ok(holds)
    }

    /// Reacquire uninterruptibly after [`release_all`](Self::release_all).
    pub(crate) fn reacquire(&self, holds: usize) {
        self.raw_lock();
        self.state.lock().hold_count = holds;
    }

    fn check_owner(&self, state: &LockState) -> Result<()> {
        if state.owner == Some(thread::current().id()) {
            Ok(())
        } else {
            Err(LockworkError::NotOwner {
                lock: self.name.clone(),
            })
        }
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new(Fairness::default())
    }
}

impl RawLock for Lock {
    fn raw_lock(&self) {
        // Without a deadline or a cancel token the wait can only end in a grant
        if let Err(err) = self.raw_lock_with(&Wait::forever()) {
            unreachable!("unbounded wait on '{}' failed: {}", self.name, err);
        }
    }

    fn raw_lock_with(&self, wait: &Wait<'_>) -> Result<()> {
        let me = thread::current();
        let id = me.id();
        let ticket = {
            let mut state = self.state.lock();
            if state.try_grant(id, self.fairness) {
                return Ok(());
            }
            wait.check()?;
            state.enqueue(me)
        };
        let fairness = self.fairness;
        wait::park_until(
            &self.state,
            wait,
            |state| state.poll_grant(ticket, id, fairness),
            |state| state.abandon(ticket, fairness),
        )
    }

    fn raw_try_lock(&self) -> bool {
        self.state
            .lock()
            .try_grant(thread::current().id(), self.fairness)
    }

    fn raw_unlock(&self) -> Result<()> {
        self.release()
    }

    fn label(&self) -> &str {
        &self.name
    }
}
