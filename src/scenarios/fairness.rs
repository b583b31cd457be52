//! Several tasks contend for one lock; the acquisition order is reported.
//!
//! The main thread holds the lock while the tasks arrive one by one, so the
//! arrival order is known. Under FIFO fairness the acquisition order must
//! match it. Under unordered fairness any order is accepted.

use super::{join_task, spawn_task, wait_for, work};
use crate::config::FairnessConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::{Fairness, Lock, RawLock};
use serde_json::json;
use std::fmt;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FairnessReport {
    pub fairness: Fairness,
    /// Task names in the order they queued.
    pub arrival: Vec<String>,
    /// Task names in the order they were granted the lock.
    pub acquired: Vec<String>,
}

impl FairnessReport {
    pub fn in_arrival_order(&self) -> bool {
        self.arrival == self.acquired
    }
}

impl fmt::Display for FairnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lock fairness ({})", self.fairness)?;
        writeln!(f, "  Arrival order:     {}", self.arrival.join(", "))?;
        writeln!(f, "  Acquisition order: {}", self.acquired.join(", "))?;
        write!(
            f,
            "  Served in arrival order: {}",
            if self.in_arrival_order() { "yes" } else { "no" }
        )
    }
}

pub fn run(config: &FairnessConfig, log: &EventLog) -> Result<FairnessReport> {
    let lock = Lock::new(config.fair).named("resource");
    let arrival: Vec<String> = (1..=config.tasks).map(|i| format!("task-{}", i)).collect();

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "fairness",
        "fairness": lock.fairness().to_string(),
        "tasks": config.tasks,
    })));

    thread::scope(|s| -> Result<()> {
        let gate = lock.acquire();
        let mut handles = Vec::with_capacity(arrival.len());
        for (i, name) in arrival.iter().enumerate() {
            let lock = &lock;
            handles.push(spawn_task(s, name.clone(), move || {
                let _guard = lock.acquire();
                log.record(Event::new(EventAction::Acquire).with_subject(lock.name()));
                work(config.hold_ms);
                log.record(Event::new(EventAction::Release).with_subject(lock.name()));
            })?);
            wait_for("task to queue", || lock.queue_len() == i + 1)?;
        }
        drop(gate);

        for handle in handles {
            join_task(handle)?;
        }
        Ok(())
    })?;

    let report = FairnessReport {
        fairness: lock.fairness(),
        arrival,
        acquired: log
            .snapshot()
            .into_iter()
            .filter(|e| e.action == EventAction::Acquire && e.subject.as_deref() == Some(lock.name()))
            .map(|e| e.actor)
            .collect(),
    };
    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "fairness",
        "in_arrival_order": report.in_arrival_order(),
    })));

    if report.fairness == Fairness::Fifo && !report.in_arrival_order() {
        return Err(LockworkError::ScenarioFailed(format!(
            "FIFO lock served {:?}, expected {:?}",
            report.acquired, report.arrival
        )));
    }
    Ok(report)
}
