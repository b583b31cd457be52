//! ScenarioConfig struct definition.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Tuning for every demonstration scenario.
///
/// Each section is optional in the YAML; missing sections and fields take
/// their defaults. Unknown fields are ignored for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Contended lock, acquisition order reported.
    pub fairness: FairnessConfig,

    /// Account withdrawals guarded by a timed acquire.
    pub withdraw: WithdrawConfig,

    /// Readers and writers over a shared counter.
    pub read_write: ReadWriteConfig,

    /// Producer-consumer through the bounded channel.
    pub handoff: HandoffConfig,

    /// Two tasks taking two locks, ordered or reversed.
    pub deadlock: DeadlockConfig,

    /// Tasks incrementing a shared counter.
    pub counter: CounterConfig,

    /// A flag raised by one task and awaited by another.
    pub visibility: VisibilityConfig,
}
