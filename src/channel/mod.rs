//! Bounded handoff channel built from a [`Lock`] and two [`Condition`]s.
//!
//! Producers wait on "not full" while every slot is taken; consumers wait on
//! "not empty" while none is. Both sides hold the channel lock for the whole
//! check-then-act step and re-check their predicate after every wake-up.
//! A capacity of 1 gives the classic single-slot handoff.


use crate::error::{LockworkError, Result};
use crate::lock::{Condition, Fairness, Lock, RawLock};
use crate::wait::Wait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

/// A produce that did not complete. The value is handed back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceError<T> {
    pub value: T,
    pub reason: LockworkError,
}

impl<T> fmt::Display for ProduceError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "produce failed: {}", self.reason)
    }
}

impl<T: fmt::Debug> std::error::Error for ProduceError<T> {}

impl<T> From<ProduceError<T>> for LockworkError {
    fn from(err: ProduceError<T>) -> Self {
        err.reason
    }
}

/// FIFO queue of at most `capacity` values shared between tasks.
#[derive(Debug)]
pub struct BoundedHandoffChannel<T> {
    lock: Lock,
    not_full: Condition,
    not_empty: Condition,
    /// Only touched while `lock` is held.
    slots: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> BoundedHandoffChannel<T> {
    /// Create an empty channel with room for `capacity` values.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LockworkError::InvalidArgument(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self::build(Lock::new(Fairness::Fifo).named("channel"), capacity))
    }

    /// Create the one-slot channel.
    pub fn single_slot() -> Self {
        Self::build(Lock::new(Fairness::Fifo).named("channel"), 1)
    }

    /// Set the diagnostic name of the channel lock.
    pub fn named(self, name: impl Into<String>) -> Self {
        let lock = self.lock.named(name);
        // Conditions capture the lock name, so they are recreated
        Self {
            not_full: lock.new_condition(),
            not_empty: lock.new_condition(),
            lock,
            slots: self.slots,
            capacity: self.capacity,
        }
    }

    fn build(lock: Lock, capacity: usize) -> Self {
        Self {
            not_full: lock.new_condition(),
            not_empty: lock.new_condition(),
            lock,
            slots: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        self.lock.name()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Store `value`, blocking while the channel is full.
    pub fn produce(&self, value: T) {
        if let Err(err) = self.produce_with(value, &Wait::forever()) {
            unreachable!("unbounded produce on '{}' failed: {}", self.name(), err);
        }
    }

    /// Store `value` within `wait`.
    ///
    /// On `TimedOut` or `Cancelled` nothing is stored and the value comes
    /// back inside the error.
    pub fn produce_with(
        &self,
        value: T,
        wait: &Wait<'_>,
    ) -> std::result::Result<(), ProduceError<T>> {
        let mut guard = match self.lock.acquire_with(wait) {
            Ok(guard) => guard,
            Err(reason) => return Err(ProduceError { value, reason }),
        };
        while self.slots.lock().len() == self.capacity {
            if let Err(reason) = self.not_full.wait(&mut guard, wait) {
                return Err(ProduceError { value, reason });
            }
        }
        self.slots.lock().push_back(value);
        self.not_empty.signal();
        Ok(())
    }

    /// Store `value` only if a slot is free right now.
    pub fn try_produce(&self, value: T) -> std::result::Result<(), T> {
        let Some(_guard) = self.lock.try_acquire() else {
            return Err(value);
        };
        let mut slots = self.slots.lock();
        if slots.len() == self.capacity {
            return Err(value);
        }
        slots.push_back(value);
        drop(slots);
        self.not_empty.signal();
        Ok(())
    }

    /// Take the oldest value, blocking while the channel is empty.
    pub fn consume(&self) -> T {
        match self.consume_with(&Wait::forever()) {
            Ok(value) => value,
            Err(err) => unreachable!("unbounded consume on '{}' failed: {}", self.name(), err),
        }
    }

    /// Take the oldest value within `wait`.
    pub fn consume_with(&self, wait: &Wait<'_>) -> Result<T> {
        let mut guard = self.lock.acquire_with(wait)?;
        loop {
            let taken = self.slots.lock().pop_front();
            if let Some(value) = taken {
                self.not_full.signal();
                return Ok(value);
            }
            self.not_empty.wait(&mut guard, wait)?;
        }
    }

    /// Take the oldest value only if one is available right now.
    pub fn try_consume(&self) -> Option<T> {
        let _guard = self.lock.try_acquire()?;
        let value = self.slots.lock().pop_front()?;
        self.not_full.signal();
        Some(value)
    }
}
