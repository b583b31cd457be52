//! Tasks incrementing one shared counter under a lock.
//!
//! The increment is a separate load and store, so without the lock updates
//! would be lost. With it the final count is exact.

use super::{join_task, spawn_task};
use crate::config::CounterConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::{Lock, RawLock};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReport {
    pub tasks: usize,
    pub increments: usize,
    pub final_count: u64,
}

impl CounterReport {
    pub fn expected(&self) -> u64 {
        (self.tasks * self.increments) as u64
    }
}

impl fmt::Display for CounterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Shared counter ({} tasks x {} increments)",
            self.tasks, self.increments
        )?;
        write!(
            f,
            "  Final count is {} (expected {})",
            self.final_count,
            self.expected()
        )
    }
}

pub fn run(config: &CounterConfig, log: &EventLog) -> Result<CounterReport> {
    let lock = Lock::fair().named("counter");
    // Only read and written while `lock` is held
    let count = AtomicU64::new(0);
    let increments = config.increments;

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "counter",
        "tasks": config.tasks,
        "increments": increments,
    })));

    thread::scope(|s| -> Result<()> {
        let (lock, count) = (&lock, &count);
        let mut handles = Vec::with_capacity(config.tasks);
        for i in 1..=config.tasks {
            handles.push(spawn_task(s, format!("task-{}", i), move || {
                for _ in 0..increments {
                    let _guard = lock.acquire();
                    let value = count.load(Ordering::Relaxed);
                    count.store(value + 1, Ordering::Relaxed);
                }
                log.record(
                    Event::new(EventAction::Write)
                        .with_subject(lock.name())
                        .with_details(json!({"increments": increments})),
                );
            })?);
        }
        for handle in handles {
            join_task(handle)?;
        }
        Ok(())
    })?;

    let report = CounterReport {
        tasks: config.tasks,
        increments,
        final_count: count.into_inner(),
    };
    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "counter",
        "final_count": report.final_count,
    })));

    if report.final_count != report.expected() {
        return Err(LockworkError::ScenarioFailed(format!(
            "final count {} but {} increments were made",
            report.final_count,
            report.expected()
        )));
    }
    Ok(report)
}
