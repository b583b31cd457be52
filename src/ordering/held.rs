//! Per-thread record of ranks held through verifying policies.

use super::Rank;
use std::cell::RefCell;

thread_local! {
    /// `(policy id, rank)` in acquisition order.
    static HELD: RefCell<Vec<(u64, Rank)>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn ranks(policy: u64) -> Vec<Rank> {
    HELD.with(|held| {
        held.borrow()
            .iter()
            .filter(|(id, _)| *id == policy)
            .map(|(_, rank)| *rank)
            .collect()
    })
}

pub(crate) fn push(policy: u64, rank: Rank) {
    HELD.with(|held| held.borrow_mut().push((policy, rank)));
}

/// Forget the most recent matching entry. Guards may drop out of order, so
/// this searches from the end rather than popping.
pub(crate) fn remove(policy: u64, rank: Rank) {
    HELD.with(|held| {
        let mut held = held.borrow_mut();
        if let Some(index) = held.iter().rposition(|entry| *entry == (policy, rank)) {
            held.remove(index);
        }
    });
}
