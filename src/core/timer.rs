/*!
 * Stage Timer
 * Named accumulating wall-clock timers for coarse phase profiling
 */

use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates elapsed time under named stages
#[derive(Debug, Default)]
pub struct StageTimer {
    totals: HashMap<&'static str, Duration>,
    running: HashMap<&'static str, Instant>,
}

impl StageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the named stage
    pub fn start(&mut self, stage: &'static str) {
        self.running.insert(stage, Instant::now());
    }

    /// Stop the named stage and fold the elapsed time into its total
    pub fn stop(&mut self, stage: &'static str) {
        if let Some(started) = self.running.remove(stage) {
            *self.totals.entry(stage).or_default() += started.elapsed();
        }
    }

    /// Accumulated time for a stage
    pub fn total(&self, stage: &str) -> Duration {
        self.totals.get(stage).copied().unwrap_or_default()
    }

    /// Log every stage total
    pub fn report(&self) {
        let mut stages: Vec<_> = self.totals.iter().collect();
        stages.sort_by_key(|(stage, _)| *stage);
        for (stage, total) in stages {
            info!("{stage}: {} us", total.as_micros());
        }
    }
}
