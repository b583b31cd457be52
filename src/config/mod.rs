//! Scenario configuration for lockwork.
//!
//! This module defines the ScenarioConfig struct loaded from a YAML file.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for every field, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::ScenarioConfig;
pub use types::{
    CounterConfig, DeadlockConfig, FairnessConfig, HandoffConfig, ReadWriteConfig,
    VisibilityConfig, WithdrawConfig,
};
