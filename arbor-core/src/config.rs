//! Reconciler Configuration
//!
//! Settings that tune diagnostics and effect scheduling for a root. All fields
//! have defaults, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::scheduler::SchedulerPriority;

/// Per-root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Emit development diagnostics (unsupported kinds, missing host parents,
    /// structural assertions) as `warn!` events.
    #[serde(default = "default_dev_diagnostics")]
    pub dev_diagnostics: bool,

    /// Priority at which the deferred passive-effect flush is requested.
    #[serde(default = "default_passive_effect_priority")]
    pub passive_effect_priority: SchedulerPriority,
}

fn default_dev_diagnostics() -> bool {
    cfg!(debug_assertions)
}

fn default_passive_effect_priority() -> SchedulerPriority {
    SchedulerPriority::Normal
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            dev_diagnostics: default_dev_diagnostics(),
            passive_effect_priority: default_passive_effect_priority(),
        }
    }
}

impl ReconcilerConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
