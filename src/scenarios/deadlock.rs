//! Two tasks that each need the same two locks.
//!
//! In the baseline, task A takes `lock1` then `lock2` while task B takes
//! `lock2` then `lock1`. Once both hold their first lock neither can ever get
//! its second: a circular wait. Each task bounds the wait for its second lock,
//! so the deadlock shows up as both tasks timing out instead of hanging.
//!
//! In the ordered variant both tasks go through a [`LockOrderingPolicy`],
//! which acquires in rank order regardless of the order requested.

use super::{StartGate, join_task, spawn_task, start_abandoned};
use crate::config::DeadlockConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::{Lock, RawLock};
use crate::ordering::LockOrderingPolicy;
use serde_json::json;
use std::fmt;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockOutcome {
    /// Both tasks held both locks in turn.
    Completed,
    /// Both tasks held one lock while waiting for the other.
    Deadlocked,
}

impl fmt::Display for DeadlockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadlockOutcome::Completed => write!(f, "completed"),
            DeadlockOutcome::Deadlocked => write!(f, "deadlocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlockReport {
    pub ordered: bool,
    pub outcome: DeadlockOutcome,
    /// Tasks that gave up waiting for their second lock.
    pub timed_out: Vec<String>,
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Two tasks, two locks ({})",
            if self.ordered {
                "lock ordering policy"
            } else {
                "reversed order"
            }
        )?;
        if !self.timed_out.is_empty() {
            writeln!(f, "  Timed out: {}", self.timed_out.join(", "))?;
        }
        write!(f, "  Outcome: {}", self.outcome)
    }
}

pub fn run(config: &DeadlockConfig, log: &EventLog) -> Result<DeadlockReport> {
    let lock1 = Lock::fair().named("lock1");
    let lock2 = Lock::fair().named("lock2");
    let timeout = Duration::from_millis(config.timeout_ms);

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "deadlock",
        "ordered": config.ordered,
    })));

    let report = if config.ordered {
        run_ordered(&lock1, &lock2, log)?
    } else {
        run_reversed(&lock1, &lock2, timeout, log)?
    };

    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "deadlock",
        "outcome": report.outcome.to_string(),
    })));

    let expected = if config.ordered {
        DeadlockOutcome::Completed
    } else {
        DeadlockOutcome::Deadlocked
    };
    if report.outcome != expected {
        return Err(LockworkError::ScenarioFailed(format!(
            "expected the run to end {}, it {}",
            expected, report.outcome
        )));
    }
    Ok(report)
}

fn run_reversed(
    lock1: &Lock,
    lock2: &Lock,
    timeout: Duration,
    log: &EventLog,
) -> Result<DeadlockReport> {
    let gate = StartGate::new();
    let both_hold_first = Barrier::new(2);

    let task = |first: &Lock, second: &Lock| -> Result<bool> {
        if !gate.pass() {
            return Err(start_abandoned());
        }
        let _first = first.acquire();
        log.record(Event::new(EventAction::Acquire).with_subject(first.name()));
        both_hold_first.wait();

        let got_second = match second.try_acquire_for(timeout) {
            Ok(_second) => {
                log.record(Event::new(EventAction::Acquire).with_subject(second.name()));
                true
            }
            Err(_) => {
                log.record(
                    Event::new(EventAction::TimedOut)
                        .with_subject(second.name())
                        .with_details(json!({"holding": first.name()})),
                );
                false
            }
        };
        // Hold the first lock until the other task has decided too
        both_hold_first.wait();
        Ok(got_second)
    };

    let (a, b) = thread::scope(|s| -> Result<(bool, bool)> {
        let task = &task;
        let hold = gate.shut();
        let a = spawn_task(s, "task-a".to_string(), move || task(lock1, lock2))?;
        let b = spawn_task(s, "task-b".to_string(), move || task(lock2, lock1))?;
        gate.open(hold);
        Ok((join_task(a)??, join_task(b)??))
    })?;

    let mut timed_out = Vec::new();
    if !a {
        timed_out.push("task-a".to_string());
    }
    if !b {
        timed_out.push("task-b".to_string());
    }
    let outcome = if timed_out.len() == 2 {
        log.record(
            Event::new(EventAction::Deadlock).with_details(json!({"tasks": timed_out.clone()})),
        );
        DeadlockOutcome::Deadlocked
    } else {
        DeadlockOutcome::Completed
    };

    Ok(DeadlockReport {
        ordered: false,
        outcome,
        timed_out,
    })
}

fn run_ordered(lock1: &Lock, lock2: &Lock, log: &EventLog) -> Result<DeadlockReport> {
    let policy = LockOrderingPolicy::new().with_verification(true);
    policy.register(lock1);
    policy.register(lock2);

    let task = |first: &Lock, second: &Lock| -> Result<()> {
        let guards = policy.acquire_all(&[first, second])?;
        log.record(Event::new(EventAction::Acquire).with_details(json!({
            "ranks": guards.ranks(),
        })));
        drop(guards);
        log.record(Event::new(EventAction::Release));
        Ok(())
    };

    thread::scope(|s| -> Result<()> {
        let task = &task;
        let a = spawn_task(s, "task-a".to_string(), move || task(lock1, lock2))?;
        let b = spawn_task(s, "task-b".to_string(), move || task(lock2, lock1))?;
        join_task(a)??;
        join_task(b)??;
        Ok(())
    })?;

    Ok(DeadlockReport {
        ordered: true,
        outcome: DeadlockOutcome::Completed,
        timed_out: Vec::new(),
    })
}
