//! Demonstration scenarios built on the lockwork primitives.
//!
//! Each scenario spawns named tasks with `std::thread::scope`, records an
//! [`EventLog`](crate::events::EventLog) trace, checks the outcome it is
//! expected to produce, and returns a typed report. A violated expectation is
//! reported as [`LockworkError::ScenarioFailed`].

pub mod account;
pub mod counter;
pub mod deadlock;
pub mod fairness;
pub mod handoff;
pub mod read_write;
pub mod visibility;

#[cfg(test)]
mod tests;

use crate::error::{LockworkError, Result};
use crate::lock::{Guard, RawLock};
use crate::rwlock::{Access, LockView, ReadWriteLock, RwPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

/// Bound on waiting for tasks to line up before a scenario proceeds.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a named task inside `scope`.
pub(crate) fn spawn_task<'scope, F, T>(
    scope: &'scope Scope<'scope, '_>,
    name: String,
    task: F,
) -> Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(scope, task)
        .map_err(|e| LockworkError::UserError(format!("failed to spawn task '{}': {}", name, e)))
}

/// Join a task, turning a panic into a scenario failure.
pub(crate) fn join_task<T>(handle: ScopedJoinHandle<'_, T>) -> Result<T> {
    let name = handle.thread().name().unwrap_or("task").to_string();
    handle
        .join()
        .map_err(|_| LockworkError::ScenarioFailed(format!("task '{}' panicked", name)))
}

/// Start line for tasks that depend on each other once running.
///
/// The spawning thread shuts the gate, spawns every task, then opens it.
/// Tasks block in [`pass`](Self::pass) until then. If the spawner bails out
/// early its hold is dropped without opening, and `pass` returns false so
/// the tasks that did start return instead of waiting on missing siblings.
#[derive(Debug)]
pub(crate) struct StartGate {
    rw: ReadWriteLock,
    opened: AtomicBool,
}

impl StartGate {
    pub(crate) fn new() -> Self {
        Self {
            rw: ReadWriteLock::with_name("start", RwPolicy::WriterPreferred),
            opened: AtomicBool::new(false),
        }
    }

    pub(crate) fn shut(&self) -> Guard<'_, LockView> {
        self.rw.write_view().acquire()
    }

    pub(crate) fn open(&self, hold: Guard<'_, LockView>) {
        self.opened.store(true, Ordering::Release);
        drop(hold);
    }

    /// Block until the gate is released. False when it was never opened.
    pub(crate) fn pass(&self) -> bool {
        drop(self.rw.read_view().acquire());
        self.opened.load(Ordering::Acquire)
    }

    /// Tasks currently blocked at the gate.
    pub(crate) fn waiting(&self) -> usize {
        self.rw.queued(Access::Read)
    }
}

/// Error a task returns when its start was abandoned.
pub(crate) fn start_abandoned() -> LockworkError {
    LockworkError::ScenarioFailed("scenario start was abandoned".to_string())
}

/// Poll `condition` until it holds. Used to stage task arrivals.
pub(crate) fn wait_for(what: &str, mut condition: impl FnMut() -> bool) -> Result<()> {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    while !condition() {
        if Instant::now() >= deadline {
            return Err(LockworkError::ScenarioFailed(format!(
                "timed out waiting for {}",
                what
            )));
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

/// Sleep for `ms` milliseconds; zero returns immediately.
pub(crate) fn work(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
