/*!
 * Tuner Types
 */

use crate::config::{AllocatorConfig, GroupBoundaries};
use crate::core::format::format_size;
use crate::core::types::Size;
use log::info;
use serde::{Deserialize, Serialize};

/// Outcome of a configuration search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TuneResult {
    /// Best configuration found (grouping boundaries embedded when used)
    pub config: AllocatorConfig,
    /// Boundaries of the winning grouping pass, if one won
    pub groups: Option<GroupBoundaries>,
    /// Difference ratio that produced the winning boundaries
    pub delta: Option<f64>,
    /// Peak reserved bytes under the best configuration
    pub peak_reserved: Size,
    /// Peak allocated bytes under the best configuration
    pub peak_allocated: Size,
    /// Peak reserved bytes under the starting configuration
    pub baseline_reserved: Size,
    /// Peak allocated bytes under the starting configuration
    pub baseline_allocated: Size,
    /// Candidates replayed
    pub evaluated: usize,
    /// Candidates discarded after address-space exhaustion
    pub dominated: usize,
}

impl TuneResult {
    /// Whether the search found anything better than the baseline
    pub fn improved(&self) -> bool {
        self.peak_reserved < self.baseline_reserved
    }

    /// Log the before/after comparison
    pub fn report(&self) {
        info!(
            "tuning result: reserved {} -> {}, allocated {} -> {} ({} candidates, {} dominated)",
            format_size(self.baseline_reserved),
            format_size(self.peak_reserved),
            format_size(self.baseline_allocated),
            format_size(self.peak_allocated),
            self.evaluated,
            self.dominated,
        );
        info!("tuned knobs: {}", self.config);
        match (&self.groups, self.delta) {
            (Some(groups), Some(delta)) => info!("grouping delta {delta}: {groups}"),
            _ => info!("no grouping"),
        }
    }
}
