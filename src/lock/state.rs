//! Bookkeeping state of a [`Lock`](super::Lock).
//!
//! Only ever touched while the lock's internal mutex is held.

use super::Fairness;
use std::collections::VecDeque;
use std::thread::{Thread, ThreadId};

/// A blocked task's queue entry.
#[derive(Debug)]
pub(crate) struct Waiter {
    /// Arrival sequence number.
    pub(crate) ticket: u64,
    pub(crate) thread: Thread,
}

#[derive(Debug, Default)]
pub(crate) struct LockState {
    pub(crate) owner: Option<ThreadId>,
    pub(crate) hold_count: usize,
    pub(crate) queue: VecDeque<Waiter>,
    next_ticket: u64,
}

impl LockState {
    /// Take the lock if the rules allow it right now.
    ///
    /// Reentrant for the current owner. Under FIFO fairness a free lock is
    /// refused while anybody is queued.
    pub(crate) fn try_grant(&mut self, me: ThreadId, fairness: Fairness) -> bool {
        match self.owner {
            Some(owner) if owner == me => {
                self.hold_count += 1;
                true
            }
            Some(_) => false,
            None if fairness == Fairness::Fifo && !self.queue.is_empty() => false,
            None => {
                self.grant(me);
                true
            }
        }
    }

    /// Check whether a queued waiter now owns the lock, taking it if allowed.
    pub(crate) fn poll_grant(&mut self, ticket: u64, me: ThreadId, fairness: Fairness) -> bool {
        match fairness {
            // Ownership was handed over by `release_one`
            Fairness::Fifo => self.owner == Some(me),
            Fairness::Unordered => {
                if self.owner.is_some() {
                    return false;
                }
                self.dequeue(ticket);
                self.grant(me);
                true
            }
        }
    }

    pub(crate) fn enqueue(&mut self, thread: Thread) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.queue.push_back(Waiter { ticket, thread });
        ticket
    }

    pub(crate) fn dequeue(&mut self, ticket: u64) {
        self.queue.retain(|waiter| waiter.ticket != ticket);
    }

    /// Remove an expired waiter and pick whoever should retry in its place.
    pub(crate) fn abandon(&mut self, ticket: u64, fairness: Fairness) -> Option<Thread> {
        self.dequeue(ticket);
        // The leaver may have consumed the wake-up meant for the next in line
        match fairness {
            Fairness::Unordered if self.owner.is_none() => {
                self.queue.front().map(|waiter| waiter.thread.clone())
            }
            _ => None,
        }
    }

    /// Give up one hold. Returns the thread to unpark when the lock became
    /// free (FIFO: the thread it was handed to).
    pub(crate) fn release_one(&mut self, fairness: Fairness) -> Option<Thread> {
        self.hold_count -= 1;
        if self.hold_count > 0 {
            return None;
        }
        self.owner = None;
        match fairness {
            Fairness::Fifo => {
                let next = self.queue.pop_front()?;
                self.grant(next.thread.id());
                Some(next.thread)
            }
            Fairness::Unordered => self.queue.front().map(|waiter| waiter.thread.clone()),
        }
    }

    fn grant(&mut self, owner: ThreadId) {
        self.owner = Some(owner);
        self.hold_count = 1;
    }
}
