//! Tests for lock ordering.

use super::*;
use serial_test::serial;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

fn pair() -> (Lock, Lock) {
    (Lock::fair().named("lock1"), Lock::fair().named("lock2"))
}

#[test]
fn test_register_assigns_ascending_ranks_once() {
    let policy = LockOrderingPolicy::new();
    let (a, b) = pair();

    assert_eq!(policy.register(&a), 1);
    assert_eq!(policy.register(&b), 2);
    assert_eq!(policy.register(&a), 1);
    assert_eq!(policy.rank_of(&b), Some(2));
    assert_eq!(policy.rank_of(&Lock::fair()), None);
}

#[test]
fn test_register_with_rank_rejects_taken_rank() {
    let policy = LockOrderingPolicy::new();
    let (a, b) = pair();

    assert_eq!(policy.register_with_rank(&a, 10), Ok(10));
    assert_eq!(policy.register_with_rank(&a, 10), Ok(10));
    assert_eq!(
        policy.register_with_rank(&b, 10),
        Err(LockworkError::RankConflict { rank: 10 })
    );
    assert!(matches!(
        policy.register_with_rank(&a, 11),
        Err(LockworkError::InvalidArgument(_))
    ));

    // Automatic ranks skip pinned ones
    let policy = LockOrderingPolicy::new();
    policy.register_with_rank(&a, 1).unwrap();
    assert_eq!(policy.register(&b), 2);
}

#[test]
fn test_assert_order() {
    let policy = LockOrderingPolicy::new();
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    assert!(policy.assert_order(&[], 1).is_ok());
    assert!(policy.assert_order(&[1], 2).is_ok());
    assert_eq!(
        policy.assert_order(&[2], 1),
        Err(LockworkError::LockOrderViolation {
            lock: "lock1".to_string(),
            held: 2,
            requested: 1,
        })
    );
    assert!(policy.assert_order(&[2], 2).is_err());
}

#[test]
fn test_verified_acquire_rejects_descending_order() {
    let policy = LockOrderingPolicy::new().with_verification(true);
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    let high = policy.acquire(&b).unwrap();
    assert_eq!(high.rank(), 2);
    assert_eq!(policy.held_ranks(), vec![2]);

    let result = policy.acquire(&a);
    assert!(matches!(
        result,
        Err(LockworkError::LockOrderViolation {
            held: 2,
            requested: 1,
            ..
        })
    ));
    // Failed before blocking or acquiring
    assert!(!a.is_locked());

    drop(high);
    assert!(policy.held_ranks().is_empty());
    assert!(!b.is_locked());
}

#[test]
fn test_verified_acquire_allows_ascending_and_reentrant() {
    let policy = LockOrderingPolicy::new().with_verification(true);
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    let low = policy.acquire(&a).unwrap();
    let high = policy.acquire(&b).unwrap();
    let again = policy.acquire(&a).unwrap();
    assert_eq!(a.hold_count(), 2);
    assert_eq!(policy.held_ranks(), vec![1, 2, 1]);

    drop(again);
    drop(high);
    drop(low);
    assert!(policy.held_ranks().is_empty());
    assert!(!a.is_locked());
}

#[test]
fn test_unverified_policy_does_not_check() {
    let policy = LockOrderingPolicy::new().with_verification(false);
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    let _high = policy.acquire(&b).unwrap();
    let _low = policy.acquire(&a).unwrap();
    assert!(policy.held_ranks().is_empty());
}

#[test]
fn test_unregistered_lock_is_rejected() {
    let policy = LockOrderingPolicy::new();
    let stray = Lock::fair().named("stray");

    assert_eq!(
        policy.acquire(&stray).err(),
        Some(LockworkError::UnregisteredLock {
            lock: "stray".to_string()
        })
    );
    assert!(!stray.is_locked());
}

#[test]
fn test_policies_track_ranks_independently() {
    let first = LockOrderingPolicy::new().with_verification(true);
    let second = LockOrderingPolicy::new().with_verification(true);
    let (a, b) = pair();
    first.register(&a);
    first.register(&b);
    second.register(&b);
    second.register(&a);

    let _b = first.acquire(&b).unwrap();
    // Rank 2 in `first` does not constrain `second`
    let _a = second.acquire(&a).unwrap();
    assert_eq!(first.held_ranks(), vec![2]);
    assert_eq!(second.held_ranks(), vec![2]);
}

#[test]
fn test_acquire_all_sorts_by_rank() {
    let policy = LockOrderingPolicy::new().with_verification(true);
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    let guards = policy.acquire_all(&[&b, &a, &b]).unwrap();
    assert_eq!(guards.ranks(), vec![1, 2]);
    assert_eq!(guards.len(), 2);
    assert!(a.is_held_by_current_thread());
    assert!(b.is_held_by_current_thread());

    drop(guards);
    assert!(!a.is_locked());
    assert!(!b.is_locked());
    assert!(policy.held_ranks().is_empty());
}

#[test]
#[serial]
fn test_acquire_all_failure_releases_taken_locks() {
    let policy = LockOrderingPolicy::new();
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    thread::scope(|s| {
        let _blocker = b.acquire();
        s.spawn(|| {
            let result = policy.acquire_all_with(&[&a, &b], &Wait::timeout(Duration::from_millis(50)));
            assert_eq!(result.err(), Some(LockworkError::TimedOut));
            assert!(!a.is_held_by_current_thread());
            assert!(policy.held_ranks().is_empty());
        });
    });

    assert!(!a.is_locked());
}

#[test]
fn test_ordered_acquisition_never_deadlocks() {
    let policy = LockOrderingPolicy::new();
    let (a, b) = pair();
    policy.register(&a);
    policy.register(&b);

    thread::scope(|s| {
        let policy = &policy;
        let (a, b) = (&a, &b);
        // Opposite argument order; acquire_all imposes the same order on both
        s.spawn(move || {
            for _ in 0..200 {
                let _guards = policy.acquire_all(&[a, b]).unwrap();
            }
        });
        s.spawn(move || {
            for _ in 0..200 {
                let _guards = policy.acquire_all(&[b, a]).unwrap();
            }
        });
    });

    assert!(!a.is_locked());
    assert!(!b.is_locked());
}

#[test]
#[serial]
fn test_reversed_order_baseline_deadlocks() {
    let (a, b) = pair();
    let both_hold_first = Barrier::new(2);

    let take = |first: &Lock, second: &Lock| {
        let _first = first.acquire();
        both_hold_first.wait();
        let second = second.try_acquire_for(Duration::from_millis(200));
        let timed_out = matches!(second, Err(LockworkError::TimedOut));
        drop(second);
        // Keep the first lock until the other task also gave up
        both_hold_first.wait();
        timed_out
    };

    let outcomes = thread::scope(|s| {
        let task_a = s.spawn(|| take(&a, &b));
        let task_b = s.spawn(|| take(&b, &a));
        (task_a.join().unwrap(), task_b.join().unwrap())
    });

    assert_eq!(outcomes, (true, true));
}
