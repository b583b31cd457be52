//! Per-scenario configuration sections and their defaults.

use serde::{Deserialize, Serialize};

/// Settings for the `fairness` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessConfig {
    /// FIFO lock when true, unordered otherwise.
    pub fair: bool,
    /// Tasks contending for the lock.
    pub tasks: usize,
    /// How long each task holds the lock.
    pub hold_ms: u64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            fair: true,
            tasks: 3,
            hold_ms: 20,
        }
    }
}

/// Settings for the `withdraw` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawConfig {
    /// Tasks each attempting one withdrawal.
    pub tasks: usize,
    /// Opening account balance.
    pub balance: u64,
    /// Amount each task withdraws.
    pub amount: u64,
    /// Bound on each task's wait for the account lock.
    pub timeout_ms: u64,
    /// Time spent inside the critical section.
    pub work_ms: u64,
}

impl Default for WithdrawConfig {
    fn default() -> Self {
        Self {
            tasks: 3,
            balance: 1000,
            amount: 500,
            timeout_ms: 100,
            work_ms: 200,
        }
    }
}

/// Settings for the `read-write` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadWriteConfig {
    pub readers: usize,
    pub writers: usize,
    /// Reads or writes performed by each task.
    pub iterations: usize,
    /// Let readers pass a queued writer.
    pub reader_preferred: bool,
}

impl Default for ReadWriteConfig {
    fn default() -> Self {
        Self {
            readers: 2,
            writers: 1,
            iterations: 10,
            reader_preferred: false,
        }
    }
}

/// Settings for the `handoff` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Values passed from producer to consumer.
    pub items: usize,
    /// Channel capacity.
    pub capacity: usize,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            items: 10,
            capacity: 1,
        }
    }
}

/// Settings for the `deadlock` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlockConfig {
    /// Acquire through a lock ordering policy instead of reversed order.
    pub ordered: bool,
    /// Bound on the wait for the second lock, used to detect the deadlock.
    pub timeout_ms: u64,
}

impl Default for DeadlockConfig {
    fn default() -> Self {
        Self {
            ordered: false,
            timeout_ms: 200,
        }
    }
}

/// Settings for the `counter` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub tasks: usize,
    /// Increments performed by each task.
    pub increments: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            tasks: 4,
            increments: 1000,
        }
    }
}

/// Settings for the `visibility` scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// How long the writer sleeps before raising the flag.
    pub delay_ms: u64,
    /// Bound on the reader's wait for the flag.
    pub timeout_ms: u64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            timeout_ms: 2000,
        }
    }
}
