//! Producer-consumer through the bounded handoff channel.

use super::{StartGate, join_task, spawn_task};
use crate::channel::BoundedHandoffChannel;
use crate::config::HandoffConfig;
use crate::error::{LockworkError, Result};
use crate::events::{Event, EventAction, EventLog};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffReport {
    pub capacity: usize,
    pub produced: usize,
    /// Values in the order the consumer took them.
    pub received: Vec<u64>,
    /// Most values ever waiting in the channel.
    pub peak_len: usize,
}

impl HandoffReport {
    /// Every value arrived once, in production order.
    pub fn in_order(&self) -> bool {
        self.received.len() == self.produced
            && self.received.iter().enumerate().all(|(i, v)| *v == i as u64)
    }
}

impl fmt::Display for HandoffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Producer-consumer (capacity {})", self.capacity)?;
        writeln!(f, "  Produced: {}", self.produced)?;
        writeln!(f, "  Consumed: {}", self.received.len())?;
        writeln!(f, "  Most values waiting: {}", self.peak_len)?;
        write!(
            f,
            "  Consumed in production order: {}",
            if self.in_order() { "yes" } else { "no" }
        )
    }
}

pub fn run(config: &HandoffConfig, log: &EventLog) -> Result<HandoffReport> {
    let channel = BoundedHandoffChannel::new(config.capacity)?.named("handoff");
    let peak_len = AtomicUsize::new(0);
    let items = config.items;
    let gate = StartGate::new();

    log.record(Event::new(EventAction::Start).with_details(json!({
        "scenario": "handoff",
        "items": items,
        "capacity": config.capacity,
    })));

    let received = thread::scope(|s| -> Result<Vec<u64>> {
        let (channel, peak_len, gate) = (&channel, &peak_len, &gate);
        let hold = gate.shut();
        let producer = spawn_task(s, "producer".to_string(), move || {
            if !gate.pass() {
                return;
            }
            for value in 0..items as u64 {
                channel.produce(value);
                peak_len.fetch_max(channel.len(), Ordering::SeqCst);
                log.record(
                    Event::new(EventAction::Produce)
                        .with_subject(channel.name())
                        .with_details(json!({"value": value})),
                );
            }
        })?;
        let consumer = spawn_task(s, "consumer".to_string(), move || {
            let mut received = Vec::with_capacity(items);
            if !gate.pass() {
                return received;
            }
            for _ in 0..items {
                let value = channel.consume();
                log.record(
                    Event::new(EventAction::Consume)
                        .with_subject(channel.name())
                        .with_details(json!({"value": value})),
                );
                received.push(value);
            }
            received
        })?;
        gate.open(hold);

        join_task(producer)?;
        join_task(consumer)
    })?;

    let report = HandoffReport {
        capacity: channel.capacity(),
        produced: items,
        received,
        peak_len: peak_len.into_inner(),
    };
    log.record(Event::new(EventAction::Complete).with_details(json!({
        "scenario": "handoff",
        "consumed": report.received.len(),
    })));

    if !report.in_order() {
        return Err(LockworkError::ScenarioFailed(format!(
            "consumer saw {:?}, expected 0..{}",
            report.received, items
        )));
    }
    if report.peak_len > report.capacity {
        return Err(LockworkError::ScenarioFailed(format!(
            "{} values waiting in a channel of capacity {}",
            report.peak_len, report.capacity
        )));
    }
    Ok(report)
}
