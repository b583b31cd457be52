//! RAII guard shared by every lock kind.

use crate::error::Result;
use crate::wait::Wait;
use std::marker::PhantomData;
use std::time::Duration;

/// Acquire/release contract implemented by [`Lock`] and the views of a
/// [`ReadWriteLock`].
///
/// The `raw_*` methods are the low-level protocol; callers normally use the
/// provided methods, which wrap a successful acquisition in a [`Guard`].
///
/// [`Lock`]: crate::lock::Lock
/// [`ReadWriteLock`]: crate::rwlock::ReadWriteLock
pub trait RawLock {
    /// Block until acquired. Cannot fail.
    fn raw_lock(&self);

    /// Block until acquired or until `wait` is over.
    fn raw_lock_with(&self, wait: &Wait<'_>) -> Result<()>;

    /// Acquire without blocking; `false` leaves the lock untouched.
    fn raw_try_lock(&self) -> bool;

    /// Undo one acquisition made by the calling thread.
    fn raw_unlock(&self) -> Result<()>;

    /// Diagnostic name used in errors and warnings.
    fn label(&self) -> &str;

    /// Block until acquired.
    fn acquire(&self) -> Guard<'_, Self>
    where
        Self: Sized,
    {
        self.raw_lock();
        Guard::new(self)
    }

    /// Block until acquired, timed out, or cancelled.
    fn acquire_with(&self, wait: &Wait<'_>) -> Result<Guard<'_, Self>>
    where
        Self: Sized,
    {
        self.raw_lock_with(wait)?;
        Ok(Guard::new(self))
    }

    /// Acquire only if possible without blocking.
    fn try_acquire(&self) -> Option<Guard<'_, Self>>
    where
        Self: Sized,
    {
        self.raw_try_lock().then(|| Guard::new(self))
    }

    /// Block for at most `timeout`.
    fn try_acquire_for(&self, timeout: Duration) -> Result<Guard<'_, Self>>
    where
        Self: Sized,
    {
        self.acquire_with(&Wait::timeout(timeout))
    }
}

/// RAII guard for one acquisition.
///
/// When dropped, the acquisition is released. If that release fails (the
/// lock was released behind the guard's back), a warning is printed but no
/// panic occurs. The guard is `!Send`: ownership belongs to the acquiring
/// thread.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct Guard<'a, L: RawLock + ?Sized> {
    lock: &'a L,

    /// Whether the acquisition has already been given back.
    released: bool,

    _not_send: PhantomData<*const ()>,
}

impl<'a, L: RawLock + ?Sized> Guard<'a, L> {
    pub(crate) fn new(lock: &'a L) -> Self {
        Self {
            lock,
            released: false,
            _not_send: PhantomData,
        }
    }

    /// The lock this guard was acquired from.
    pub fn lock(&self) -> &'a L {
        self.lock
    }

    /// Whether [`release`](Self::release) has already run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release before the guard goes out of scope.
    ///
    /// Returns `Ok(true)` when this call released the lock and `Ok(false)`
    /// when the guard was already released (a no-op). An error means the
    /// lock was no longer held by this thread.
    pub fn release(&mut self) -> Result<bool> {
        if self.released {
            return Ok(false);
        }
        self.released = true;
        self.lock.raw_unlock()?;
        Ok(true)
    }

    /// Keep the lock held past the guard.
    ///
    /// The caller takes over the obligation to release it through the
    /// lock's own `release`.
    pub fn forget(mut self) {
        self.released = true;
    }
}

impl<L: RawLock + ?Sized> Drop for Guard<'_, L> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.raw_unlock()
        {
            eprintln!(
                "Warning: failed to release lock '{}': {}",
                self.lock.label(),
                e
            );
        }
    }
}
