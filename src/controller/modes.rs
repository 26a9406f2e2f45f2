/*!
 * Mode Flags
 * Per-instance collection/optimization switches
 */

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Individually toggleable controller behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeFlag {
    /// Record events into an in-memory trace for later replay
    AsyncTracing,
    /// Execute every event against the engine immediately
    FunctionalityChecking,
    /// Accumulate the trace and run the search at the iteration cutoff
    Profiling,
    /// Search the knob product
    ConfigOptimization,
    /// Search the grouping ratios
    GroupOptimization,
    /// Dump completed traces per iteration
    TraceDumping,
    /// Dump per-op memory usage rows
    DebugDumping,
    /// Dump free-pool snapshots as JSON
    PoolSnapshotDumping,
}

/// The full flag set with its one-time defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModeFlags {
    pub async_tracing: bool,
    pub functionality_checking: bool,
    pub profiling: bool,
    pub config_optimization: bool,
    pub group_optimization: bool,
    pub trace_dumping: bool,
    pub debug_dumping: bool,
    pub pool_snapshot_dumping: bool,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            async_tracing: true,
            functionality_checking: false,
            profiling: true,
            config_optimization: true,
            group_optimization: false,
            trace_dumping: false,
            debug_dumping: false,
            pool_snapshot_dumping: false,
        }
    }
}

impl ModeFlags {
    pub fn get(&self, flag: ModeFlag) -> bool {
        match flag {
            ModeFlag::AsyncTracing => self.async_tracing,
            ModeFlag::FunctionalityChecking => self.functionality_checking,
            ModeFlag::Profiling => self.profiling,
            ModeFlag::ConfigOptimization => self.config_optimization,
            ModeFlag::GroupOptimization => self.group_optimization,
            ModeFlag::TraceDumping => self.trace_dumping,
            ModeFlag::DebugDumping => self.debug_dumping,
            ModeFlag::PoolSnapshotDumping => self.pool_snapshot_dumping,
        }
    }

    pub fn set(&mut self, flag: ModeFlag, enable: bool) {
        info!("mode {flag:?} -> {enable}");
        match flag {
            ModeFlag::AsyncTracing => self.async_tracing = enable,
            ModeFlag::FunctionalityChecking => self.functionality_checking = enable,
            ModeFlag::Profiling => self.profiling = enable,
            ModeFlag::ConfigOptimization => self.config_optimization = enable,
            ModeFlag::GroupOptimization => self.group_optimization = enable,
            ModeFlag::TraceDumping => self.trace_dumping = enable,
            ModeFlag::DebugDumping => self.debug_dumping = enable,
            ModeFlag::PoolSnapshotDumping => self.pool_snapshot_dumping = enable,
        }
    }
}

impl fmt::Display for ModeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "async_tracing={} functionality_checking={} profiling={} \
             config_optimization={} group_optimization={} trace_dumping={} \
             debug_dumping={} pool_snapshot_dumping={}",
            self.async_tracing,
            self.functionality_checking,
            self.profiling,
            self.config_optimization,
            self.group_optimization,
            self.trace_dumping,
            self.debug_dumping,
            self.pool_snapshot_dumping
        )
    }
}
