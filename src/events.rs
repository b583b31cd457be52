//! Event trace for scenario runs.
//!
//! Scenario tasks record what they did into a shared in-memory [`EventLog`].
//! After a run the trace can be appended to a file in NDJSON format (one JSON
//! object per line).
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `seq`: position in the trace, assigned when recorded
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (acquire, release, timed_out, produce, ...)
//! - `actor`: name of the thread that recorded it
//! - `subject`: optional lock or channel name
//! - `details`: freeform object with action-specific details
//!
//! # Usage
//!
//! ```no_run
//! use lockwork::events::{Event, EventAction, EventLog, append_events};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let log = EventLog::new();
//! log.record(Event::new(EventAction::Acquire).with_subject("account"));
//! log.record(Event::new(EventAction::Withdraw).with_details(json!({"amount": 50})));
//! append_events(Path::new("trace.ndjson"), &log.snapshot())?;
//! # Ok::<(), lockwork::error::LockworkError>(())
//! ```

use crate::error::{LockworkError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;

/// Actions that can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Scenario run started
    Start,
    /// Lock or view acquired
    Acquire,
    /// Lock or view released
    Release,
    /// Bounded wait expired
    TimedOut,
    /// Wait abandoned through a cancel token
    Cancelled,
    /// Value stored in a channel
    Produce,
    /// Value taken from a channel
    Consume,
    /// Shared value read under a read hold
    Read,
    /// Shared value updated under an exclusive hold
    Write,
    /// Account withdrawal attempted
    Withdraw,
    /// Circular wait detected
    Deadlock,
    /// Scenario run finished
    Complete,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Start => write!(f, "start"),
            EventAction::Acquire => write!(f, "acquire"),
            EventAction::Release => write!(f, "release"),
            EventAction::TimedOut => write!(f, "timed_out"),
            EventAction::Cancelled => write!(f, "cancelled"),
            EventAction::Produce => write!(f, "produce"),
            EventAction::Consume => write!(f, "consume"),
            EventAction::Read => write!(f, "read"),
            EventAction::Write => write!(f, "write"),
            EventAction::Withdraw => write!(f, "withdraw"),
            EventAction::Deadlock => write!(f, "deadlock"),
            EventAction::Complete => write!(f, "complete"),
        }
    }
}

/// One record in a scenario trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Position in the trace. Zero until recorded into an [`EventLog`].
    pub seq: u64,

    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// Name of the recording thread (`main`, `task-2`, ...).
    pub actor: String,

    /// Lock or channel the event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and thread name.
    pub fn new(action: EventAction) -> Self {
        Self {
            seq: 0,
            ts: Utc::now(),
            action,
            actor: current_actor(),
            subject: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            LockworkError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

fn current_actor() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// Thread-safe, append-only trace shared by the tasks of one run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event`, assigning the next sequence number. Returns it.
    pub fn record(&self, mut event: Event) -> u64 {
        let mut events = self.events.lock();
        event.seq = events.len() as u64 + 1;
        let seq = event.seq;
        events.push(event);
        seq
    }

    /// Copy of the trace so far, in sequence order.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Actors of every `action` event, in sequence order.
    pub fn actors_for(&self, action: EventAction) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.actor.clone())
            .collect()
    }

    /// Number of recorded `action` events.
    pub fn count(&self, action: EventAction) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

/// Append `events` to the NDJSON file at `path`.
///
/// The file and its parent directory are created if missing. Each event is
/// written as one line with a trailing newline, then the file is synced.
pub fn append_events(path: &Path, events: &[Event]) -> Result<()> {
    let mut lines = String::new();
    for event in events {
        lines.push_str(&event.to_ndjson_line()?);
        lines.push('\n');
    }

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| {
            LockworkError::UserError(format!(
                "failed to create events directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LockworkError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    file.write_all(lines.as_bytes()).map_err(|e| {
        LockworkError::UserError(format!(
            "failed to write events to '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        LockworkError::UserError(format!(
            "failed to sync events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}
