//! Read/write lock with two views over one shared state record.
//!
//! Many readers or one writer at a time. Both views implement [`RawLock`], so
//! they are acquired and released exactly like a [`Lock`](crate::lock::Lock)
//! and hand out the same [`Guard`](crate::lock::Guard).
//!
//! # Preference Policy
//!
//! | Policy                     | New reader while a writer is queued | Starvation risk |
//! |----------------------------|-------------------------------------|-----------------|
//! | `WriterPreferred` (default) | waits behind the writer            | readers, under continuous writes |
//! | `ReaderPreferred`          | enters alongside other readers      | writers, under continuous reads |
//!
//! Writers are always served in arrival order among themselves. A thread that
//! already holds a read hold may read again without waiting. Upgrading (read
//! then write) or reading while holding the write view waits forever, as with
//! `std::sync::RwLock`.

mod state;


use crate::error::{LockworkError, Result};
use crate::lock::RawLock;
use crate::wait::{self, Wait};
use parking_lot::Mutex;
use state::RwState;
use std::fmt;
use std::sync::Arc;
use std::thread;

/// Which view an acquisition goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Arbitration between queued writers and arriving readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RwPolicy {
    /// A queued writer blocks new readers, bounding write latency.
    #[default]
    WriterPreferred,
    /// Readers enter whenever no writer is active.
    ReaderPreferred,
}

impl fmt::Display for RwPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RwPolicy::WriterPreferred => write!(f, "writer_preferred"),
            RwPolicy::ReaderPreferred => write!(f, "reader_preferred"),
        }
    }
}

/// A read/write lock. Obtain the views with [`read_view`](Self::read_view)
/// and [`write_view`](Self::write_view).
#[derive(Debug)]
pub struct ReadWriteLock {
    read: LockView,
    write: LockView,
}

/// The state record both views share; lives as long as any view does.
#[derive(Debug)]
struct Shared {
    policy: RwPolicy,
    state: Mutex<RwState>,
}

impl ReadWriteLock {
    pub fn new(policy: RwPolicy) -> Self {
        Self::with_name("rwlock", policy)
    }

    pub fn with_name(name: &str, policy: RwPolicy) -> Self {
        let shared = Arc::new(Shared {
            policy,
            state: Mutex::new(RwState::default()),
        });
        Self {
            read: LockView {
                shared: Arc::clone(&shared),
                access: Access::Read,
                label: format!("{}.read", name),
            },
            write: LockView {
                shared,
                access: Access::Write,
                label: format!("{}.write", name),
            },
        }
    }

    pub fn policy(&self) -> RwPolicy {
        self.read.shared.policy
    }

    /// The shared (read) view.
    pub fn read_view(&self) -> &LockView {
        &self.read
    }

    /// The exclusive (write) view.
    pub fn write_view(&self) -> &LockView {
        &self.write
    }

    /// Total read holds currently granted.
    pub fn reader_count(&self) -> usize {
        self.read.shared.state.lock().reader_count
    }

    pub fn is_write_locked(&self) -> bool {
        self.read.shared.state.lock().writer.is_some()
    }

    /// Number of tasks blocked on the given view.
    pub fn queued(&self, access: Access) -> usize {
        self.read.shared.state.lock().queued(access)
    }
}

impl Default for ReadWriteLock {
    fn default() -> Self {
        Self::new(RwPolicy::default())
    }
}

/// One view of a [`ReadWriteLock`].
///
/// Cloning a view shares the same state record.
#[derive(Debug, Clone)]
pub struct LockView {
    shared: Arc<Shared>,
    access: Access,
    label: String,
}

impl LockView {
    pub fn access(&self) -> Access {
        self.access
    }

    fn lock_with(&self, wait: &Wait<'_>) -> Result<()> {
        let me = thread::current();
        let id = me.id();
        let (access, policy) = (self.access, self.shared.policy);
        let ticket = {
            let mut state = self.shared.state.lock();
            if state.try_enter(id, access, None, policy) {
                return Ok(());
            }
            wait.check()?;
            state.enqueue(me, access)
        };
        wait::park_until(
            &self.shared.state,
            wait,
            |state| state.try_enter(id, access, Some(ticket), policy),
            |state| {
                state.dequeue(ticket);
                // A departing writer may have been what held new readers back
                state.eligible(policy)
            },
        )
    }
}

impl RawLock for LockView {
    fn raw_lock(&self) {
        // Without a deadline or a cancel token the wait can only end in a grant
        if let Err(err) = self.lock_with(&Wait::forever()) {
            unreachable!("unbounded wait on '{}' failed: {}", self.label, err);
        }
    }

    fn raw_lock_with(&self, wait: &Wait<'_>) -> Result<()> {
        self.lock_with(wait)
    }

    fn raw_try_lock(&self) -> bool {
        self.shared.state.lock().try_enter(
            thread::current().id(),
            self.access,
            None,
            self.shared.policy,
        )
    }

    fn raw_unlock(&self) -> Result<()> {
        let wake = {
            let mut state = self.shared.state.lock();
            if !state.leave(thread::current().id(), self.access) {
                return Err(LockworkError::NotOwner {
                    lock: self.label.clone(),
                });
            }
            state.eligible(self.shared.policy)
        };
        for thread in wake {
            thread.unpark();
        }
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
