/*!
 * Configuration Autotuner
 *
 * Exhaustive search over the knob product plus an adaptive grouping
 * discovery pass, ranking candidates by the peak reserved bytes their
 * replay produces. The engine is reset (cache emptied, peaks zeroed)
 * between candidates so every evaluation starts cold.
 */

pub mod candidates;
mod grouping;
mod types;

pub use grouping::synthesize_groups;
pub use types::TuneResult;

use crate::config::{AllocatorConfig, GroupBoundaries};
use crate::core::format::format_size;
use crate::core::timer::StageTimer;
use crate::core::types::{DeviceId, Size, StreamId};
use crate::engine::{CacheEngine, MemoryUsage};
use crate::replay::{ReplayError, ReplayResult, Replayer, Trace};
use candidates::{knob_sets, GROUP_DELTAS};
use log::{info, warn};

/// Searches the configuration space against one recorded trace
pub struct Tuner<'a> {
    trace: &'a Trace,
    device: DeviceId,
    stream: StreamId,
    base: AllocatorConfig,
    engine: CacheEngine,
    /// Device capacity limit carried into every candidate engine
    capacity: Option<Size>,

    best_reserved: Size,
    best_allocated: Size,
    best_config: AllocatorConfig,
    best_groups: Option<GroupBoundaries>,
    best_delta: Option<f64>,
    baseline_reserved: Size,
    baseline_allocated: Size,
    evaluated: usize,
    dominated: usize,
}

impl<'a> Tuner<'a> {
    pub fn new(trace: &'a Trace, device: DeviceId, stream: StreamId) -> Self {
        Self::with_base(trace, device, stream, AllocatorConfig::default())
    }

    /// Tuner whose baseline and fallback is `base` instead of the defaults
    pub fn with_base(
        trace: &'a Trace,
        device: DeviceId,
        stream: StreamId,
        base: AllocatorConfig,
    ) -> Self {
        Self {
            trace,
            device,
            stream,
            best_config: base.clone(),
            base,
            engine: CacheEngine::new(),
            capacity: None,
            best_reserved: Size::MAX,
            best_allocated: Size::MAX,
            best_groups: None,
            best_delta: None,
            baseline_reserved: Size::MAX,
            baseline_allocated: Size::MAX,
            evaluated: 0,
            dominated: 0,
        }
    }

    /// Evaluate every candidate against a device holding only `capacity`
    /// bytes; candidates that exhaust it rank as dominated
    pub fn with_capacity(mut self, capacity: Size) -> Self {
        self.capacity = Some(capacity);
        self.engine = self.fresh_engine();
        self
    }

    fn fresh_engine(&self) -> CacheEngine {
        match self.capacity {
            Some(capacity) => CacheEngine::with_capacity(AllocatorConfig::default(), capacity)
                .expect("default configuration is valid"),
            None => CacheEngine::new(),
        }
    }

    // =========================================================================
    // Search modes
    // =========================================================================

    /// Enumerate the six-knob product without grouping
    pub fn search_config(mut self) -> ReplayResult<TuneResult> {
        let mut timer = StageTimer::new();
        timer.start("config_search");
        self.establish_baseline()?;

        for knobs in knob_sets() {
            let config = AllocatorConfig::with_knobs(knobs);
            if config.validate().is_err() {
                continue;
            }
            if let Some(usage) = self.evaluate(&config, None)? {
                self.consider(&config, None, None, usage);
            }
        }

        timer.stop("config_search");
        timer.report();
        Ok(self.finish())
    }

    /// Sweep the difference ratios over the baseline configuration
    pub fn search_group(mut self) -> ReplayResult<TuneResult> {
        self.establish_baseline()?;

        let base = self.base.clone();
        for &delta in &GROUP_DELTAS {
            let groups = synthesize_groups(self.trace, delta, base.large_buffer);
            if groups.is_unset() {
                continue;
            }
            if let Some(usage) = self.evaluate(&base, Some(&groups))? {
                self.consider(&base, Some(&groups), Some(delta), usage);
            }
        }

        Ok(self.finish())
    }

    /// Greedy coordinate descent: sweep one knob's candidates at a time,
    /// keeping each knob's winner while the others stay fixed
    ///
    /// Orders of magnitude cheaper than the full product and usually lands
    /// close to it; the full search remains the reference mode.
    pub fn search_greedy(mut self) -> ReplayResult<TuneResult> {
        self.establish_baseline()?;

        let sets: [&[Size]; 6] = [
            &candidates::MIN_BLOCK_SIZE_CANDIDATES,
            &candidates::SMALL_SIZE_CANDIDATES,
            &candidates::SMALL_BUFFER_CANDIDATES,
            &candidates::LARGE_BUFFER_CANDIDATES,
            &candidates::MIN_LARGE_ALLOC_CANDIDATES,
            &candidates::ROUND_LARGE_CANDIDATES,
        ];

        let mut current = self.base.knobs();
        for (index, set) in sets.iter().enumerate() {
            for &candidate in set.iter() {
                let mut knobs = current;
                knobs[index] = candidate;
                let config = AllocatorConfig::with_knobs(knobs);
                if config.validate().is_err() {
                    continue;
                }
                if let Some(usage) = self.evaluate(&config, None)? {
                    if self.consider(&config, None, None, usage) {
                        current = knobs;
                    }
                }
            }
        }

        Ok(self.finish())
    }

    /// Evaluate a caller-supplied shortlist of knob tuples
    ///
    /// Tuples with knobs outside the declared candidate sets, or violating
    /// configuration validity, are skipped rather than evaluated.
    pub fn search_shortlist(mut self, shortlist: &[[Size; 6]]) -> ReplayResult<TuneResult> {
        self.establish_baseline()?;

        for &knobs in shortlist {
            if let Err(err) = candidates::validate_knobs(&knobs) {
                warn!("skipping shortlist entry: {err}");
                continue;
            }
            let config = AllocatorConfig::with_knobs(knobs);
            if config.validate().is_err() {
                continue;
            }
            if let Some(usage) = self.evaluate(&config, None)? {
                self.consider(&config, None, None, usage);
            }
        }

        Ok(self.finish())
    }

    /// Full product of knob tuples and difference ratios
    pub fn search_config_with_group(mut self) -> ReplayResult<TuneResult> {
        let mut timer = StageTimer::new();
        timer.start("combined_search");
        self.establish_baseline()?;

        for knobs in knob_sets() {
            let config = AllocatorConfig::with_knobs(knobs);
            if config.validate().is_err() {
                continue;
            }
            if let Some(usage) = self.evaluate(&config, None)? {
                self.consider(&config, None, None, usage);
            }
            for &delta in &GROUP_DELTAS {
                let groups = synthesize_groups(self.trace, delta, config.large_buffer);
                if groups.is_unset() {
                    continue;
                }
                if let Some(usage) = self.evaluate(&config, Some(&groups))? {
                    self.consider(&config, Some(&groups), Some(delta), usage);
                }
            }
        }

        timer.stop("combined_search");
        timer.report();
        Ok(self.finish())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Replay the baseline configuration so every search starts from a
    /// measured reference point
    fn establish_baseline(&mut self) -> ReplayResult<()> {
        let base = self.base.clone();
        if let Some(usage) = self.evaluate(&base, None)? {
            self.baseline_reserved = usage.peak_reserved;
            self.baseline_allocated = usage.peak_allocated;
            self.best_reserved = usage.peak_reserved;
            self.best_allocated = usage.peak_allocated;
            self.best_config = base;
            info!(
                "baseline: reserved {}, allocated {}",
                format_size(usage.peak_reserved),
                format_size(usage.peak_allocated)
            );
        } else {
            warn!("baseline configuration is dominated; keeping it as fallback");
        }
        Ok(())
    }

    /// Replay one candidate; `None` means skipped or dominated
    fn evaluate(
        &mut self,
        config: &AllocatorConfig,
        groups: Option<&GroupBoundaries>,
    ) -> ReplayResult<Option<MemoryUsage>> {
        let mut candidate = config.clone();
        if let Some(groups) = groups {
            candidate.groups = *groups;
        }
        if self.engine.set_config(candidate).is_err() {
            return Ok(None);
        }
        self.engine.set_grouping(groups.is_some());

        self.evaluated += 1;
        match Replayer::replay(self.trace, &mut self.engine, self.device, self.stream) {
            Ok(usage) => {
                self.engine.empty_cache();
                self.engine.reset_peaks();
                Ok(Some(usage))
            }
            Err(ReplayError::Alloc(_)) => {
                // Candidate exhausted the address space mid-replay: its
                // engine state is unrecoverable, start the next one fresh
                self.dominated += 1;
                self.engine = self.fresh_engine();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Adopt the candidate iff it strictly lowers peak reserved bytes
    fn consider(
        &mut self,
        config: &AllocatorConfig,
        groups: Option<&GroupBoundaries>,
        delta: Option<f64>,
        usage: MemoryUsage,
    ) -> bool {
        if usage.peak_reserved >= self.best_reserved {
            return false;
        }
        self.best_reserved = usage.peak_reserved;
        self.best_allocated = usage.peak_allocated;
        self.best_config = config.clone();
        self.best_groups = groups.copied();
        self.best_delta = delta;
        info!(
            "new best: reserved {} ({})",
            format_size(usage.peak_reserved),
            config
        );
        true
    }

    fn finish(self) -> TuneResult {
        let mut config = self.best_config;
        if let Some(groups) = self.best_groups {
            config.groups = groups;
        }
        let result = TuneResult {
            config,
            groups: self.best_groups,
            delta: self.best_delta,
            peak_reserved: self.best_reserved,
            peak_allocated: self.best_allocated,
            baseline_reserved: self.baseline_reserved,
            baseline_allocated: self.baseline_allocated,
            evaluated: self.evaluated,
            dominated: self.dominated,
        };
        result.report();
        result
    }
}
