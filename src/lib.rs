//! Lockwork: explicit locks, wait-conditions and lock ordering for threads.
//!
//! The core primitives:
//! - [`Lock`]: reentrant exclusive lock with FIFO or unordered fairness
//! - [`ReadWriteLock`]: shared/exclusive lock with an explicit preference policy
//! - [`BoundedHandoffChannel`]: producer-consumer queue built from a lock and
//!   two wait-conditions
//! - [`LockOrderingPolicy`]: total lock order for tasks holding several locks
//!
//! Every blocking call takes a [`Wait`] (deadline and cancel token) and every
//! acquisition hands out a [`Guard`] that releases on drop.

pub mod cancel;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod lock;
pub mod ordering;
pub mod rwlock;
pub mod scenarios;
pub mod wait;

#[cfg(test)]
mod test_support;

pub use cancel::CancelToken;
pub use channel::{BoundedHandoffChannel, ProduceError};
pub use error::{LockworkError, Result};
pub use lock::{Condition, Fairness, Guard, Lock, LockId, RawLock};
pub use ordering::{LockOrderingPolicy, OrderedGuards, Rank, RankedGuard};
pub use rwlock::{Access, LockView, ReadWriteLock, RwPolicy};
pub use wait::Wait;
