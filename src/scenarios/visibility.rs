//! One task raises a flag, another polls until it sees it.
//!
//! The writer publishes a payload and then the flag, both while holding the
//! `flag` lock. The reader samples both under the same lock, so once it sees
//! the flag it also sees the payload written before it. The reader's wait is
//! bounded and a flag that never shows up fails the scenario.

use super::{join_task, spawn_task, work};
use crate::config::VisibilityConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::{Lock, RawLock};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Value the writer publishes alongside the flag.
const PAYLOAD: u64 = 42;

/// A flag and its payload, published under one lock.
#[derive(Debug)]
pub struct Flag {
    lock: Lock,
    /// Both read and written only while `lock` is held.
    raised: AtomicBool,
    payload: AtomicU64,
}

impl Flag {
    pub fn new() -> Self {
        Self {
            lock: Lock::fair().named("flag"),
            raised: AtomicBool::new(false),
            payload: AtomicU64::new(0),
        }
    }

    pub fn raise(&self, payload: u64) {
        let _guard = self.lock.acquire();
        self.payload.store(payload, Ordering::Relaxed);
        self.raised.store(true, Ordering::Relaxed);
    }

    /// The payload, once the flag is raised.
    pub fn sample(&self) -> Option<u64> {
        let _guard = self.lock.acquire();
        self.raised
            .load(Ordering::Relaxed)
            .then(|| self.payload.load(Ordering::Relaxed))
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityReport {
    pub delay_ms: u64,
    /// Payload seen with the flag, or `None` if the reader gave up.
    pub observed: Option<u64>,
    /// Samples taken by the reader.
    pub polls: u64,
    /// Time from the reader's start to its last sample.
    pub waited_ms: u64,
}

impl fmt::Display for VisibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Flag visibility (raised after {}ms)", self.delay_ms)?;
        match self.observed {
            Some(payload) => writeln!(f, "  Reader saw the flag with payload {}", payload)?,
            None => writeln!(f, "  Reader never saw the flag")?,
        }
        write!(f, "  {} polls over {}ms", self.polls, self.waited_ms)
    }
}

pub fn run(config: &VisibilityConfig, log: &EventLog) -> Result<VisibilityReport> {
    let flag = Flag::new();
    let timeout = Duration::from_millis(config.timeout_ms);

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "visibility",
        "delay_ms": config.delay_ms,
        "timeout_ms": config.timeout_ms,
    })));

    let report = thread::scope(|s| -> Result<VisibilityReport> {
        let flag = &flag;
        let reader = spawn_task(s, "reader".to_string(), move || {
            let start = Instant::now();
            let mut polls = 0u64;
            let observed = loop {
                polls += 1;
                if let Some(payload) = flag.sample() {
                    break Some(payload);
                }
                if start.elapsed() >= timeout {
                    break None;
                }
                thread::yield_now();
            };
            let waited_ms = start.elapsed().as_millis() as u64;
            match observed {
                Some(payload) => log.record(
                    Event::new(EventAction::Read)
                        .with_subject(flag.lock.name())
                        .with_details(json!({"payload": payload, "polls": polls})),
                ),
                None => log.record(
                    Event::new(EventAction::TimedOut)
                        .with_subject(flag.lock.name())
                        .with_details(json!({"timeout_ms": timeout.as_millis() as u64})),
                ),
            };
            (observed, polls, waited_ms)
        })?;
        let writer = spawn_task(s, "writer".to_string(), move || {
            work(config.delay_ms);
            flag.raise(PAYLOAD);
            log.record(
                Event::new(EventAction::Write)
                    .with_subject(flag.lock.name())
                    .with_details(json!({"payload": PAYLOAD})),
            );
        })?;

        join_task(writer)?;
        let (observed, polls, waited_ms) = join_task(reader)?;
        Ok(VisibilityReport {
            delay_ms: config.delay_ms,
            observed,
            polls,
            waited_ms,
        })
    })?;

    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "visibility",
        "observed": report.observed.is_some(),
    })));

    match report.observed {
        Some(PAYLOAD) => Ok(report),
        Some(other) => Err(LockworkError::ScenarioFailed(format!(
            "reader saw the flag with payload {}, expected {}",
            other, PAYLOAD
        ))),
        None => Err(LockworkError::ScenarioFailed(format!(
            "reader did not see the flag within {}ms",
            config.timeout_ms
        ))),
    }
}
