//! Total lock ordering for tasks that hold several locks at once.
//!
//! Every lock in a jointly-used set gets a distinct rank. Acquiring in
//! ascending rank order and releasing in descending order rules out circular
//! wait. [`LockOrderingPolicy::acquire_all`] makes that structural: it sorts
//! the set itself. Single acquisitions through [`LockOrderingPolicy::acquire`]
//! can additionally be verified against the ranks the calling thread already
//! holds, failing fast with [`LockworkError::LockOrderViolation`].
//!
//! Verification is on by default in debug builds.

mod held;

#[cfg(test)]
mod tests;

use crate::error::{LockworkError, Result};
use crate::lock::{Guard, Lock, LockId, RawLock};
use crate::wait::Wait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a lock in a policy's total order. Lower ranks come first.
pub type Rank = u32;

#[derive(Debug, Default)]
struct RankTable {
    by_lock: HashMap<LockId, Rank>,
    /// Lock name per rank, for diagnostics.
    names: BTreeMap<Rank, String>,
    next: Rank,
}

impl RankTable {
    fn lock_name(&self, rank: Rank) -> String {
        self.names
            .get(&rank)
            .cloned()
            .unwrap_or_else(|| format!("rank {}", rank))
    }
}

/// A total order over a set of locks.
#[derive(Debug)]
pub struct LockOrderingPolicy {
    id: u64,
    verify: bool,
    ranks: Mutex<RankTable>,
}

impl LockOrderingPolicy {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            verify: cfg!(debug_assertions),
            ranks: Mutex::new(RankTable {
                next: 1,
                ..RankTable::default()
            }),
        }
    }

    /// Turn runtime order verification on or off.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn is_verifying(&self) -> bool {
        self.verify
    }

    /// Assign `lock` the next free rank. Registering the same lock again
    /// returns the rank it already has.
    pub fn register(&self, lock: &Lock) -> Rank {
        let mut table = self.ranks.lock();
        if let Some(rank) = table.by_lock.get(&lock.id()) {
            return *rank;
        }
        while table.names.contains_key(&table.next) {
            table.next += 1;
        }
        let rank = table.next;
        table.next += 1;
        table.by_lock.insert(lock.id(), rank);
        table.names.insert(rank, lock.name().to_string());
        rank
    }

    /// Pin `lock` to an explicit rank.
    pub fn register_with_rank(&self, lock: &Lock, rank: Rank) -> Result<Rank> {
        let mut table = self.ranks.lock();
        match table.by_lock.get(&lock.id()) {
            Some(existing) if *existing == rank => return Ok(rank),
            Some(existing) => {
                return Err(LockworkError::InvalidArgument(format!(
                    "lock '{}' already has rank {}",
                    lock.name(),
                    existing
                )));
            }
            None => {}
        }
        if table.names.contains_key(&rank) {
            return Err(LockworkError::RankConflict { rank });
        }
        table.by_lock.insert(lock.id(), rank);
        table.names.insert(rank, lock.name().to_string());
        Ok(rank)
    }

    pub fn rank_of(&self, lock: &Lock) -> Option<Rank> {
        self.ranks.lock().by_lock.get(&lock.id()).copied()
    }

    /// Check that every held rank is strictly below `requested`.
    pub fn assert_order(&self, held: &[Rank], requested: Rank) -> Result<()> {
        match held.iter().copied().filter(|rank| *rank >= requested).max() {
            Some(highest) => Err(LockworkError::LockOrderViolation {
                lock: self.ranks.lock().lock_name(requested),
                held: highest,
                requested,
            }),
            None => Ok(()),
        }
    }

    /// Ranks the calling thread currently holds through this policy, in
    /// acquisition order. Always empty when verification is off.
    pub fn held_ranks(&self) -> Vec<Rank> {
        held::ranks(self.id)
    }

    /// Acquire one registered lock, blocking until granted.
    pub fn acquire<'a>(&self, lock: &'a Lock) -> Result<RankedGuard<'a>> {
        self.acquire_with(lock, &Wait::forever())
    }

    /// Acquire one registered lock within `wait`.
    ///
    /// With verification on, requesting a rank at or below one already held
    /// fails before blocking. Reacquiring a lock the thread already owns is
    /// always allowed.
    pub fn acquire_with<'a>(&self, lock: &'a Lock, wait: &Wait<'_>) -> Result<RankedGuard<'a>> {
        let rank = self
            .rank_of(lock)
            .ok_or_else(|| LockworkError::UnregisteredLock {
                lock: lock.name().to_string(),
            })?;
        if self.verify && !lock.is_held_by_current_thread() {
            self.assert_order(&self.held_ranks(), rank)?;
        }
        let guard = lock.acquire_with(wait)?;
        if self.verify {
            held::push(self.id, rank);
        }
        Ok(RankedGuard {
            guard,
            policy: self.id,
            rank,
            tracked: self.verify,
        })
    }

    /// Acquire every lock in `locks` in ascending rank order.
    pub fn acquire_all<'a>(&self, locks: &[&'a Lock]) -> Result<OrderedGuards<'a>> {
        self.acquire_all_with(locks, &Wait::forever())
    }

    /// Acquire every lock in `locks` in ascending rank order within one
    /// shared `wait`. On failure the locks taken so far are released.
    pub fn acquire_all_with<'a>(
        &self,
        locks: &[&'a Lock],
        wait: &Wait<'_>,
    ) -> Result<OrderedGuards<'a>> {
        let mut ranked = Vec::with_capacity(locks.len());
        for lock in locks {
            let rank = self
                .rank_of(lock)
                .ok_or_else(|| LockworkError::UnregisteredLock {
                    lock: lock.name().to_string(),
                })?;
            ranked.push((rank, *lock));
        }
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.dedup_by_key(|(rank, _)| *rank);

        let mut guards = OrderedGuards {
            guards: Vec::with_capacity(ranked.len()),
        };
        for (_, lock) in ranked {
            guards.guards.push(self.acquire_with(lock, wait)?);
        }
        Ok(guards)
    }
}

impl Default for LockOrderingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for a lock acquired through a [`LockOrderingPolicy`].
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct RankedGuard<'a> {
    guard: Guard<'a, Lock>,
    policy: u64,
    rank: Rank,
    tracked: bool,
}

impl<'a> RankedGuard<'a> {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn lock(&self) -> &'a Lock {
        self.guard.lock()
    }
}

impl Drop for RankedGuard<'_> {
    fn drop(&mut self) {
        if self.tracked {
            held::remove(self.policy, self.rank);
        }
    }
}

/// Guards from [`LockOrderingPolicy::acquire_all`], released in descending
/// rank order when dropped.
#[derive(Debug)]
#[must_use = "the locks are released as soon as the guards are dropped"]
pub struct OrderedGuards<'a> {
    guards: Vec<RankedGuard<'a>>,
}

impl<'a> OrderedGuards<'a> {
    /// Ranks held, ascending.
    pub fn ranks(&self) -> Vec<Rank> {
        self.guards.iter().map(RankedGuard::rank).collect()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for OrderedGuards<'_> {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}
