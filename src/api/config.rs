use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProjectionError, ProjectionResult};

/// Pipeline bootstrap configuration.
///
/// This type is serializable so viewers can persist/load their projection
/// tuning alongside other preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Per-tick budget granted to cooperative recompute tasks.
    #[serde(default = "default_slice_budget_usec")]
    pub slice_budget_usec: u64,
    /// Default item cap for sampled models; `0` means unbounded.
    #[serde(default)]
    pub sampled_max_items: usize,
    /// Default edge widening for time filter models.
    #[serde(default)]
    pub time_filter_inclusive: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            slice_budget_usec: default_slice_budget_usec(),
            sampled_max_items: 0,
            time_filter_inclusive: false,
        }
    }
}

impl ProjectionConfig {
    #[must_use]
    pub fn with_slice_budget_usec(mut self, slice_budget_usec: u64) -> Self {
        self.slice_budget_usec = slice_budget_usec;
        self
    }

    #[must_use]
    pub fn with_sampled_max_items(mut self, sampled_max_items: usize) -> Self {
        self.sampled_max_items = sampled_max_items;
        self
    }

    #[must_use]
    pub fn with_time_filter_inclusive(mut self, inclusive: bool) -> Self {
        self.time_filter_inclusive = inclusive;
        self
    }

    /// Slice budget as a `Duration`, falling back to the default when zero.
    #[must_use]
    pub fn slice_budget(self) -> Duration {
        if self.slice_budget_usec == 0 {
            warn!("zero slice budget configured; using default");
            return Duration::from_micros(default_slice_budget_usec());
        }
        Duration::from_micros(self.slice_budget_usec)
    }

    pub fn validate(self) -> ProjectionResult<Self> {
        if self.slice_budget_usec == 0 {
            return Err(ProjectionError::InvalidConfig(
                "slice budget must be > 0 usec".to_owned(),
            ));
        }
        Ok(self)
    }

    pub fn from_json_str(input: &str) -> ProjectionResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            ProjectionError::InvalidConfig(format!("failed to parse projection config: {e}"))
        })?;
        config.validate()
    }

    pub fn to_json_pretty(self) -> ProjectionResult<String> {
        serde_json::to_string_pretty(&self).map_err(|e| {
            ProjectionError::InvalidConfig(format!("failed to serialize projection config: {e}"))
        })
    }
}

fn default_slice_budget_usec() -> u64 {
    1_000
}

/// Per-session view flags consumed by the callgraph and process views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default)]
    pub bottom_up: bool,
    #[serde(default)]
    pub categorize_frames: bool,
    #[serde(default)]
    pub hide_system_libraries: bool,
    #[serde(default)]
    pub ignore_process_0: bool,
    #[serde(default)]
    pub ignore_kernel_processes: bool,
    #[serde(default)]
    pub include_threads: bool,
    #[serde(default)]
    pub left_heavy: bool,
    #[serde(default)]
    pub merge_similar_processes: bool,
}

impl SessionOptions {
    pub fn from_json_str(input: &str) -> ProjectionResult<Self> {
        serde_json::from_str(input).map_err(|e| {
            ProjectionError::InvalidConfig(format!("failed to parse session options: {e}"))
        })
    }

    pub fn to_json_pretty(self) -> ProjectionResult<String> {
        serde_json::to_string_pretty(&self).map_err(|e| {
            ProjectionError::InvalidConfig(format!("failed to serialize session options: {e}"))
        })
    }
}
