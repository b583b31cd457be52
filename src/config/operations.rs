//! Config loading, validation, and serialization.

use super::model::ScenarioConfig;
use crate::error::{LockworkError, Result};
use std::path::Path;

impl ScenarioConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(ScenarioConfig)` - Successfully loaded and validated config
    /// * `Err(LockworkError::UserError)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockworkError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file means all defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ScenarioConfig = serde_yaml::from_str(yaml).map_err(|e| {
            LockworkError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockworkError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Task counts, iteration counts, capacities and timeouts must all be
    /// positive. Hold and work times may be zero.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("fairness.tasks", self.fairness.tasks as u64),
            ("withdraw.tasks", self.withdraw.tasks as u64),
            ("withdraw.amount", self.withdraw.amount),
            ("withdraw.timeout_ms", self.withdraw.timeout_ms),
            ("read_write.writers", self.read_write.writers as u64),
            ("read_write.iterations", self.read_write.iterations as u64),
            ("handoff.items", self.handoff.items as u64),
            ("handoff.capacity", self.handoff.capacity as u64),
            ("deadlock.timeout_ms", self.deadlock.timeout_ms),
            ("counter.tasks", self.counter.tasks as u64),
            ("counter.increments", self.counter.increments as u64),
            ("visibility.timeout_ms", self.visibility.timeout_ms),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(LockworkError::UserError(format!(
                    "config validation failed: {} must be greater than 0",
                    field
                )));
            }
        }

        Ok(())
    }
}
