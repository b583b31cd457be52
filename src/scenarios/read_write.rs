//! Readers and writers sharing one counter through a read/write lock.
//!
//! Writers increment the counter under the write view; readers sample it
//! under the read view. The counter must end at `writers * iterations`, and
//! each reader must see it only grow.

use super::{join_task, spawn_task};
use crate::config::ReadWriteConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::lock::RawLock;
use crate::rwlock::{ReadWriteLock, RwPolicy};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

/// A counter guarded by a read/write lock.
#[derive(Debug)]
pub struct SharedCounter {
    rw: ReadWriteLock,
    /// Written only under the write view.
    value: AtomicU64,
    /// Most readers ever inside at once.
    peak_readers: AtomicUsize,
}

impl SharedCounter {
    pub fn new(policy: RwPolicy) -> Self {
        Self {
            rw: ReadWriteLock::with_name("counter", policy),
            value: AtomicU64::new(0),
            peak_readers: AtomicUsize::new(0),
        }
    }

    pub fn read(&self) -> u64 {
        let _guard = self.rw.read_view().acquire();
        self.peak_readers
            .fetch_max(self.rw.reader_count(), Ordering::SeqCst);
        self.value.load(Ordering::SeqCst)
    }

    /// Increment and return the new value.
    pub fn write(&self) -> u64 {
        let _guard = self.rw.write_view().acquire();
        let value = self.value.load(Ordering::SeqCst) + 1;
        self.value.store(value, Ordering::SeqCst);
        value
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn peak_readers(&self) -> usize {
        self.peak_readers.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> RwPolicy {
        self.rw.policy()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteReport {
    pub policy: RwPolicy,
    pub readers: usize,
    pub writers: usize,
    pub reads: usize,
    pub writes: usize,
    pub final_count: u64,
    pub peak_readers: usize,
}

impl fmt::Display for ReadWriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Read/write counter ({}, {} readers, {} writers)",
            self.policy, self.readers, self.writers
        )?;
        writeln!(f, "  Reads:  {}", self.reads)?;
        writeln!(f, "  Writes: {}", self.writes)?;
        writeln!(f, "  Most concurrent readers: {}", self.peak_readers)?;
        write!(f, "  Final count is {}", self.final_count)
    }
}

pub fn run(config: &ReadWriteConfig, log: &EventLog) -> Result<ReadWriteReport> {
    let policy = if config.reader_preferred {
        RwPolicy::ReaderPreferred
    } else {
        RwPolicy::WriterPreferred
    };
    let counter = SharedCounter::new(policy);
    let iterations = config.iterations;

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "read_write",
        "policy": policy.to_string(),
        "readers": config.readers,
        "writers": config.writers,
    })));

    let regressions = thread::scope(|s| -> Result<usize> {
        let counter = &counter;
        let mut writers = Vec::with_capacity(config.writers);
        for i in 1..=config.writers {
            writers.push(spawn_task(s, format!("writer-{}", i), move || {
                for _ in 0..iterations {
                    let value = counter.write();
                    log.record(
                        Event::new(EventAction::Write)
                            .with_subject("counter")
                            .with_details(json!({"value": value})),
                    );
                }
            })?);
        }
        let mut readers = Vec::with_capacity(config.readers);
        for i in 1..=config.readers {
            readers.push(spawn_task(s, format!("reader-{}", i), move || {
                let mut last = 0;
                let mut regressions = 0usize;
                for _ in 0..iterations {
                    let value = counter.read();
                    if value < last {
                        regressions += 1;
                    }
                    last = value;
                    log.record(
                        Event::new(EventAction::Read)
                            .with_subject("counter")
                            .with_details(json!({"value": value})),
                    );
                }
                regressions
            })?);
        }

        for handle in writers {
            join_task(handle)?;
        }
        let mut regressions = 0;
        for handle in readers {
            regressions += join_task(handle)?;
        }
        Ok(regressions)
    })?;

    let report = ReadWriteReport {
        policy: counter.policy(),
        readers: config.readers,
        writers: config.writers,
        reads: log.count(EventAction::Read),
        writes: log.count(EventAction::Write),
        final_count: counter.value(),
        peak_readers: counter.peak_readers(),
    };
    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "read_write",
        "final_count": report.final_count,
    })));

    let expected = (config.writers * iterations) as u64;
    if report.final_count != expected {
        return Err(LockworkError::ScenarioFailed(format!(
            "final count {} does not match {} writes",
            report.final_count, expected
        )));
    }
    if regressions > 0 {
        return Err(LockworkError::ScenarioFailed(format!(
            "readers saw the counter decrease {} times",
            regressions
        )));
    }
    Ok(report)
}
