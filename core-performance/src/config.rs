//! Navigator configuration

use core_runtime::config::{CoreConfig, DEFAULT_LATENCY_BUDGET};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Transitions slower than this are logged as warnings
    pub latency_budget: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            latency_budget: DEFAULT_LATENCY_BUDGET,
        }
    }
}

impl NavigatorConfig {
    pub fn with_latency_budget(mut self, budget: Duration) -> Self {
        self.latency_budget = budget;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.latency_budget.is_zero() {
            return Err("latency_budget must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl From<&CoreConfig> for NavigatorConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            latency_budget: config.latency_budget,
        }
    }
}
