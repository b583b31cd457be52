//! Tests for the demonstration scenarios.

use super::*;
use crate::config::{
    CounterConfig, DeadlockConfig, FairnessConfig, HandoffConfig, ReadWriteConfig,
    VisibilityConfig, WithdrawConfig,
};
use crate::events::{EventAction, EventLog};
use crate::lock::Fairness;
use serial_test::serial;
use std::time::Duration;

#[test]
fn test_fifo_fairness_serves_arrival_order() {
    let log = EventLog::new();
    let config = FairnessConfig {
        fair: true,
        tasks: 5,
        hold_ms: 1,
    };

    let report = fairness::run(&config, &log).unwrap();

    assert_eq!(report.fairness, Fairness::Fifo);
    assert!(report.in_arrival_order());
    assert_eq!(report.acquired.len(), 5);
    assert_eq!(log.count(EventAction::Release), 5);
}

#[test]
fn test_unordered_fairness_serves_every_task() {
    let log = EventLog::new();
    let config = FairnessConfig {
        fair: false,
        tasks: 4,
        hold_ms: 0,
    };

    let report = fairness::run(&config, &log).unwrap();

    assert_eq!(report.fairness, Fairness::Unordered);
    let mut acquired = report.acquired.clone();
    acquired.sort();
    assert_eq!(acquired, report.arrival);
}

#[test]
#[serial]
fn test_withdraw_times_out_waiting_tasks() {
    let log = EventLog::new();
    let config = WithdrawConfig {
        tasks: 3,
        balance: 1000,
        amount: 500,
        timeout_ms: 50,
        work_ms: 300,
    };

    let report = account::run(&config, &log).unwrap();

    assert_eq!(report.completed(), 1);
    assert_eq!(report.timed_out(), 2);
    assert_eq!(report.closing, 500);
    assert_eq!(log.count(EventAction::TimedOut), 2);
}

#[test]
fn test_withdraw_never_overdraws() {
    let log = EventLog::new();
    let config = WithdrawConfig {
        tasks: 4,
        balance: 1000,
        amount: 400,
        timeout_ms: 5000,
        work_ms: 0,
    };

    let report = account::run(&config, &log).unwrap();

    assert_eq!(report.completed(), 2);
    assert_eq!(report.insufficient(), 2);
    assert_eq!(report.timed_out(), 0);
    assert_eq!(report.closing, 200);
}

#[test]
fn test_account_withdraw_reports_insufficient_funds() {
    let log = EventLog::new();
    let account = account::Account::new(100);

    let outcome = account
        .withdraw(150, Duration::from_millis(10), 0, &log)
        .unwrap();

    assert_eq!(
        outcome,
        account::Withdrawal::InsufficientFunds { balance: 100 }
    );
    assert_eq!(account.balance(), 100);
}

#[test]
fn test_read_write_counts_every_write() {
    let log = EventLog::new();
    let config = ReadWriteConfig {
        readers: 3,
        writers: 2,
        iterations: 50,
        reader_preferred: false,
    };

    let report = read_write::run(&config, &log).unwrap();

    assert_eq!(report.final_count, 100);
    assert_eq!(report.writes, 100);
    assert_eq!(report.reads, 150);
    assert!(report.peak_readers <= 3);
}

#[test]
fn test_read_write_reader_preferred() {
    let log = EventLog::new();
    let config = ReadWriteConfig {
        readers: 2,
        writers: 1,
        iterations: 20,
        reader_preferred: true,
    };

    let report = read_write::run(&config, &log).unwrap();

    assert_eq!(report.policy, crate::rwlock::RwPolicy::ReaderPreferred);
    assert_eq!(report.final_count, 20);
}

#[test]
fn test_shared_counter_readers_run_together() {
    let counter = read_write::SharedCounter::new(Default::default());
    counter.write();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| counter.read());
        }
    });

    assert_eq!(counter.value(), 1);
    assert!(counter.peak_readers() >= 1);
}

#[test]
fn test_handoff_delivers_in_order() {
    let log = EventLog::new();
    let config = HandoffConfig {
        items: 100,
        capacity: 1,
    };

    let report = handoff::run(&config, &log).unwrap();

    assert!(report.in_order());
    assert!(report.peak_len <= 1);
    assert_eq!(log.count(EventAction::Produce), 100);
    assert_eq!(log.count(EventAction::Consume), 100);
}

#[test]
fn test_handoff_with_larger_capacity() {
    let log = EventLog::new();
    let config = HandoffConfig {
        items: 50,
        capacity: 4,
    };

    let report = handoff::run(&config, &log).unwrap();

    assert!(report.in_order());
    assert!(report.peak_len <= 4);
}

#[test]
fn test_handoff_rejects_zero_capacity() {
    let log = EventLog::new();
    let config = HandoffConfig {
        items: 1,
        capacity: 0,
    };

    assert!(matches!(
        handoff::run(&config, &log),
        Err(LockworkError::InvalidArgument(_))
    ));
}

#[test]
#[serial]
fn test_reversed_order_is_detected_as_deadlock() {
    let log = EventLog::new();
    let config = DeadlockConfig {
        ordered: false,
        timeout_ms: 100,
    };

    let report = deadlock::run(&config, &log).unwrap();

    assert_eq!(report.outcome, deadlock::DeadlockOutcome::Deadlocked);
    assert_eq!(report.timed_out, vec!["task-a", "task-b"]);
    assert_eq!(log.count(EventAction::Deadlock), 1);
}

#[test]
fn test_ordered_acquisition_completes() {
    let log = EventLog::new();
    let config = DeadlockConfig {
        ordered: true,
        timeout_ms: 100,
    };

    let report = deadlock::run(&config, &log).unwrap();

    assert_eq!(report.outcome, deadlock::DeadlockOutcome::Completed);
    assert!(report.timed_out.is_empty());
    assert_eq!(log.count(EventAction::Deadlock), 0);
    assert_eq!(log.count(EventAction::Acquire), 2);
}

#[test]
fn test_counter_is_exact() {
    let log = EventLog::new();
    let config = CounterConfig {
        tasks: 4,
        increments: 500,
    };

    let report = counter::run(&config, &log).unwrap();

    assert_eq!(report.final_count, 2000);
    assert_eq!(report.final_count, report.expected());
}

#[test]
fn test_visibility_reader_sees_flag_and_payload() {
    let log = EventLog::new();
    let config = VisibilityConfig {
        delay_ms: 20,
        timeout_ms: 2000,
    };

    let report = visibility::run(&config, &log).unwrap();

    assert_eq!(report.observed, Some(42));
    assert!(report.polls >= 1);
    assert_eq!(log.count(EventAction::Write), 1);
    assert_eq!(log.count(EventAction::Read), 1);
    assert_eq!(log.count(EventAction::TimedOut), 0);
}

#[test]
fn test_visibility_flag_sample() {
    let flag = visibility::Flag::new();
    assert_eq!(flag.sample(), None);

    thread::scope(|s| {
        s.spawn(|| flag.raise(7));
    });
    assert_eq!(flag.sample(), Some(7));
}

#[test]
#[serial]
fn test_visibility_fails_when_reader_gives_up_first() {
    let log = EventLog::new();
    let config = VisibilityConfig {
        delay_ms: 300,
        timeout_ms: 20,
    };

    let result = visibility::run(&config, &log);

    assert!(matches!(result, Err(LockworkError::ScenarioFailed(_))));
    assert_eq!(log.count(EventAction::TimedOut), 1);
    assert_eq!(log.count(EventAction::Read), 0);
}

#[test]
fn test_start_gate_releases_tasks_when_opened() {
    let gate = StartGate::new();

    let passed = thread::scope(|s| {
        let hold = gate.shut();
        let task = s.spawn(|| gate.pass());
        wait_for("task to reach the gate", || gate.waiting() == 1).unwrap();
        gate.open(hold);
        task.join().unwrap()
    });

    assert!(passed);
    assert_eq!(gate.waiting(), 0);
}

#[test]
fn test_start_gate_turns_tasks_back_when_abandoned() {
    let gate = StartGate::new();

    let passed = thread::scope(|s| {
        let hold = gate.shut();
        let task = s.spawn(|| gate.pass());
        wait_for("task to reach the gate", || gate.waiting() == 1).unwrap();
        // The spawner gives up without opening
        drop(hold);
        task.join().unwrap()
    });

    assert!(!passed);
}

#[test]
fn test_wait_for_returns_once_condition_holds() {
    let mut polls = 0;
    let result = wait_for("third poll", || {
        polls += 1;
        polls == 3
    });
    assert!(result.is_ok());
    assert_eq!(polls, 3);
}

#[test]
fn test_join_task_reports_panic_as_failure() {
    let result = thread::scope(|s| {
        let handle = spawn_task(s, "doomed".to_string(), || {
            if Duration::ZERO.is_zero() {
                panic!("task failed");
            }
        })
        .unwrap();
        join_task(handle)
    });

    match result {
        Err(LockworkError::ScenarioFailed(msg)) => assert!(msg.contains("doomed")),
        other => panic!("expected scenario failure, got {:?}", other),
    }
}

#[test]
fn test_report_display() {
    let report = counter::CounterReport {
        tasks: 2,
        increments: 3,
        final_count: 6,
    };
    let text = report.to_string();
    assert!(text.contains("2 tasks x 3 increments"));
    assert!(text.contains("Final count is 6"));
}

#[test]
fn test_visibility_report_display() {
    let report = visibility::VisibilityReport {
        delay_ms: 100,
        observed: Some(42),
        polls: 12,
        waited_ms: 101,
    };
    let text = report.to_string();
    assert!(text.contains("raised after 100ms"));
    assert!(text.contains("payload 42"));
    assert!(text.contains("12 polls"));
}
