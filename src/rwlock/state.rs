//! Shared state record behind both views of a read/write lock.

use super::{Access, RwPolicy};
use std::collections::{HashMap, VecDeque};
use std::thread::{Thread, ThreadId};

#[derive(Debug)]
pub(crate) struct RwWaiter {
    pub(crate) ticket: u64,
    pub(crate) thread: Thread,
    pub(crate) access: Access,
}

/// Invariant: `writer.is_some()` implies `reader_count == 0`.
#[derive(Debug, Default)]
pub(crate) struct RwState {
    /// Total read holds across all readers.
    pub(crate) reader_count: usize,
    /// Read holds per thread, for reentrant reads and owner checks.
    readers: HashMap<ThreadId, usize>,
    pub(crate) writer: Option<ThreadId>,
    writer_holds: usize,
    pub(crate) queue: VecDeque<RwWaiter>,
    next_ticket: u64,
}

impl RwState {
    pub(crate) fn queued(&self, access: Access) -> usize {
        self.queue.iter().filter(|w| w.access == access).count()
    }

    fn front_writer(&self) -> Option<u64> {
        self.queue
            .iter()
            .find(|w| w.access == Access::Write)
            .map(|w| w.ticket)
    }

    /// Whether `me` may take a read hold. A thread already reading always
    /// may, so reentrant reads never wait behind a queued writer.
    fn can_read(&self, me: ThreadId, policy: RwPolicy) -> bool {
        if self.writer.is_some() {
            return false;
        }
        if self.readers.contains_key(&me) {
            return true;
        }
        match policy {
            RwPolicy::WriterPreferred => self.front_writer().is_none(),
            RwPolicy::ReaderPreferred => true,
        }
    }

    /// Whether `me` may take the write hold. Queued writers are served in
    /// arrival order; a non-queued attempt (`ticket == None`) must not pass
    /// any of them.
    fn can_write(&self, me: ThreadId, ticket: Option<u64>) -> bool {
        if self.writer == Some(me) {
            return true;
        }
        self.writer.is_none() && self.reader_count == 0 && self.front_writer() == ticket
    }

    pub(crate) fn try_enter(
        &mut self,
        me: ThreadId,
        access: Access,
        ticket: Option<u64>,
        policy: RwPolicy,
    ) -> bool {
        let allowed = match access {
            Access::Read => self.can_read(me, policy),
            Access::Write => self.can_write(me, ticket),
        };
        if !allowed {
            return false;
        }
        if let Some(ticket) = ticket {
            self.dequeue(ticket);
        }
        match access {
            Access::Read => {
                *self.readers.entry(me).or_insert(0) += 1;
                self.reader_count += 1;
            }
            Access::Write => {
                self.writer = Some(me);
                self.writer_holds += 1;
            }
        }
        true
    }

    /// Give up one hold of `access`. `false` when `me` holds none.
    pub(crate) fn leave(&mut self, me: ThreadId, access: Access) -> bool {
        match access {
            Access::Read => {
                let Some(holds) = self.readers.get_mut(&me) else {
                    return false;
                };
                *holds -= 1;
                if *holds == 0 {
                    self.readers.remove(&me);
                }
                self.reader_count -= 1;
            }
            Access::Write => {
                if self.writer != Some(me) {
                    return false;
                }
                self.writer_holds -= 1;
                if self.writer_holds == 0 {
                    self.writer = None;
                }
            }
        }
        true
    }

    pub(crate) fn enqueue(&mut self, thread: Thread, access: Access) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.queue.push_back(RwWaiter {
            ticket,
            thread,
            access,
        });
        ticket
    }

    pub(crate) fn dequeue(&mut self, ticket: u64) {
        self.queue.retain(|w| w.ticket != ticket);
    }

    /// Queued threads that could enter if they polled right now.
    pub(crate) fn eligible(&self, policy: RwPolicy) -> Vec<Thread> {
        self.queue
            .iter()
            .filter(|w| match w.access {
                Access::Read => self.can_read(w.thread.id(), policy),
                Access::Write => self.can_write(w.thread.id(), Some(w.ticket)),
            })
            .map(|w| w.thread.clone())
            .collect()
    }
}
