/*!
 * Simulation Controller
 *
 * The host-facing per-instance handle: owns the monotonic op counter, the
 * collection modes, the engine, the trace recorder, and the profile/apply
 * lifecycle around iteration boundaries.
 *
 * ## Lifecycle
 *
 * - **Profiling mode**: events accumulate into the trace; at the end of the
 *   configured iteration the selected search runs and the best
 *   configuration (plus grouping boundaries, when searched) is persisted
 * - **Apply mode** (profiling off): the persisted configuration is loaded
 *   and applied before the first event
 * - Iteration boundaries may additionally dump per-iteration traces for
 *   offline study
 */

mod dump;
mod modes;
mod persist;
mod types;

pub use dump::{PoolSnapshotDumper, TraceDumper, UsageDumper};
pub use modes::{ModeFlag, ModeFlags};
pub use persist::FileConfigStore;
pub use types::{ControlError, ControlResult};

use crate::block::BlockId;
use crate::config::{AllocatorConfig, BestConfig, ConfigStore, GroupBoundaries};
use crate::core::limits::PROFILE_ITERATIONS;
use crate::core::types::{Address, DeviceId, OpId, Size, StreamId};
use crate::engine::{CacheEngine, MemoryUsage};
use crate::replay::{ApiEvent, TraceError, TraceRecorder};
use crate::tuner::{TuneResult, Tuner};
use ahash::RandomState;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opaque per-instance simulator handle
pub struct Controller {
    device: DeviceId,
    stream: StreamId,
    opid: OpId,
    modes: ModeFlags,
    engine: CacheEngine,
    recorder: TraceRecorder,
    /// Sync-mode bookkeeping: host pointer -> engine block
    live: HashMap<Address, BlockId, RandomState>,
    iteration: u64,
    tuned: Option<TuneResult>,
    store: FileConfigStore,
    dump_dir: PathBuf,
    /// First op of the not-yet-dumped trace suffix
    dump_watermark: OpId,
    trace_dump: Option<TraceDumper>,
    usage_dump: Option<UsageDumper>,
    pool_dump: Option<PoolSnapshotDumper>,
    applied: bool,
}

impl Controller {
    /// New instance writing its artifacts under `output/`
    pub fn new(device: DeviceId, stream: StreamId) -> Self {
        Self::with_paths(device, stream, "output/best_config.txt", "output")
    }

    /// New instance with explicit persistence and dump locations
    pub fn with_paths(
        device: DeviceId,
        stream: StreamId,
        config_path: impl Into<PathBuf>,
        dump_dir: impl Into<PathBuf>,
    ) -> Self {
        let modes = ModeFlags::default();
        debug!("instance for device {device} stream {stream}: {modes}");
        Self {
            device,
            stream,
            opid: 0,
            modes,
            engine: CacheEngine::new(),
            recorder: TraceRecorder::new(),
            live: HashMap::default(),
            iteration: 0,
            tuned: None,
            store: FileConfigStore::new(config_path),
            dump_dir: dump_dir.into(),
            dump_watermark: 0,
            trace_dump: None,
            usage_dump: None,
            pool_dump: None,
            applied: false,
        }
    }

    // =========================================================================
    // Host-facing surface
    // =========================================================================

    /// Toggle one controller behavior
    pub fn set_mode(&mut self, flag: ModeFlag, enable: bool) {
        self.modes.set(flag, enable);
        if flag == ModeFlag::Profiling && enable {
            self.engine.enable_stats();
        }
    }

    /// Observe one malloc/free event
    ///
    /// `size > 0` is a malloc of `size` bytes at `ptr`; any other size is a
    /// free of `ptr` (only the sign matters). `is_real` distinguishes a true
    /// deallocation from a cache-release hint.
    pub fn collect_trace(&mut self, ptr: Address, size: i64, is_real: bool) -> ControlResult<()> {
        let op = self.next_op();

        if size > 0 {
            let size = size as Size;
            if self.modes.async_tracing {
                self.recorder.record_malloc(op, ptr, size)?;
            }
            if self.modes.functionality_checking {
                let id = self.engine.malloc(self.device, size, self.stream)?;
                if self.live.insert(ptr, id).is_some() {
                    return Err(TraceError::PointerStillActive { op, ptr }.into());
                }
                self.dump_usage_row(op, size as i64)?;
            }
        } else {
            if !is_real {
                debug!("op {op}: cache-release hint for {ptr:#x}");
            }
            if self.modes.async_tracing {
                self.recorder.record_free(op, ptr)?;
            }
            if self.modes.functionality_checking {
                let id = self
                    .live
                    .remove(&ptr)
                    .ok_or(TraceError::FreeBeforeMalloc { op, ptr })?;
                let freed = self.engine.block(id).size;
                self.engine.free(id);
                if is_real {
                    self.dump_usage_row(op, -(freed as i64))?;
                }
            }
        }

        self.dump_pool_snapshot(op)?;
        Ok(())
    }

    /// Observe one non-block API event
    pub fn collect_api(&mut self, event: ApiEvent) -> ControlResult<()> {
        let op = self.next_op();
        if self.modes.async_tracing {
            self.recorder.record_api(op, event);
        }
        if self.modes.functionality_checking {
            match event {
                ApiEvent::EmptyCache => self.engine.empty_cache(),
            }
            self.dump_usage_row(op, 0)?;
        }
        Ok(())
    }

    /// Signal an iteration boundary; returns whether a live
    /// reconfiguration just occurred
    pub fn iteration_trigger(&mut self, at_begin: bool) -> ControlResult<bool> {
        if at_begin {
            return self.on_iteration_begin();
        }
        self.on_iteration_end()
    }

    /// Mirror of the engine's segment-size helper for host-side rounding
    pub fn allocation_size_of(&self, size: Size) -> Size {
        self.engine
            .config()
            .allocation_size(size, self.engine.grouping_enabled())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn usage(&self) -> MemoryUsage {
        self.engine.usage()
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn modes(&self) -> &ModeFlags {
        &self.modes
    }

    pub fn best(&self) -> Option<&TuneResult> {
        self.tuned.as_ref()
    }

    pub fn engine(&self) -> &CacheEngine {
        &self.engine
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    /// Events observed so far
    pub fn next_op_id(&self) -> OpId {
        self.opid
    }

    /// Flush the per-op usage dump's trailing summary
    pub fn finalize_dumps(&mut self) -> ControlResult<()> {
        if let Some(dump) = self.usage_dump.as_mut() {
            dump.finish()?;
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle internals
    // =========================================================================

    fn next_op(&mut self) -> OpId {
        let op = self.opid;
        self.opid += 1;
        op
    }

    fn on_iteration_begin(&mut self) -> ControlResult<bool> {
        if self.modes.profiling || self.applied {
            return Ok(false);
        }
        // Apply mode: recall the persisted best before the first event.
        // Fully-sentinel boundaries mean grouping lost the search, so the
        // grouped allocation path stays off.
        let best = self.store.load(self.modes.group_optimization)?;
        let mut config = AllocatorConfig::with_knobs(best.knobs);
        let grouped = best.groups.map(|g| !g.is_unset()).unwrap_or(false);
        if let Some(groups) = best.groups {
            config.groups = groups;
        }
        self.engine.set_config(config)?;
        self.engine.set_grouping(grouped);
        self.applied = true;
        info!(
            "applied persisted config from {} (grouping {})",
            self.store.path().display(),
            if grouped { "on" } else { "off" }
        );
        Ok(true)
    }

    fn on_iteration_end(&mut self) -> ControlResult<bool> {
        self.iteration += 1;
        debug!("iteration {} ended", self.iteration);

        if self.modes.trace_dumping {
            if self.trace_dump.is_none() {
                self.trace_dump = Some(TraceDumper::create(self.dump_dir.join("trace_dump.csv"))?);
            }
            let dumper = self.trace_dump.as_mut().expect("just created");
            dumper.dump_iteration(self.iteration, self.recorder.trace(), self.dump_watermark)?;
            self.dump_watermark = self.opid;
        }

        if self.modes.profiling && self.iteration >= PROFILE_ITERATIONS && self.tuned.is_none() {
            return self.run_search();
        }

        if !self.modes.profiling || self.tuned.is_some() {
            // Already tuned (or never profiling): bound trace growth
            self.recorder.discard_completed();
        }
        Ok(false)
    }

    fn run_search(&mut self) -> ControlResult<bool> {
        // Close the trace so still-live blocks free at the end of the replay
        self.opid = self.recorder.close(self.opid)?;
        let trace = self.recorder.take_trace();
        if trace.is_empty() {
            warn!("profiling cutoff reached with an empty trace; nothing to tune");
            return Ok(false);
        }

        let base = self.engine.config().clone();
        let tuner = Tuner::with_base(&trace, self.device, self.stream, base);
        let result = match (self.modes.config_optimization, self.modes.group_optimization) {
            (true, true) => tuner.search_config_with_group()?,
            (true, false) => tuner.search_config()?,
            (false, true) => tuner.search_group()?,
            (false, false) => {
                debug!("profiling cutoff reached with no optimization mode enabled");
                return Ok(false);
            }
        };

        self.engine.set_config(result.config.clone())?;
        self.engine.set_grouping(result.groups.is_some());

        // With group optimization on, the file always carries the five
        // boundary lines; a losing grouping pass writes the sentinels
        let groups = self
            .modes
            .group_optimization
            .then(|| result.groups.unwrap_or_else(GroupBoundaries::unset));
        let best = BestConfig {
            knobs: result.config.knobs(),
            groups,
            callpath_hashes: Vec::new(),
        };
        self.store.save(&best)?;

        self.tuned = Some(result);
        Ok(true)
    }

    fn dump_usage_row(&mut self, op: OpId, delta: i64) -> ControlResult<()> {
        if !self.modes.debug_dumping {
            return Ok(());
        }
        if self.usage_dump.is_none() {
            self.usage_dump = Some(UsageDumper::create(self.dump_dir.join("memory_usage.csv"))?);
        }
        let usage = self.engine.usage();
        self.usage_dump
            .as_mut()
            .expect("just created")
            .record(op, delta, usage.current_allocated, usage.current_reserved)?;
        Ok(())
    }

    fn dump_pool_snapshot(&mut self, op: OpId) -> ControlResult<()> {
        if !self.modes.pool_snapshot_dumping || !self.modes.functionality_checking {
            return Ok(());
        }
        if self.pool_dump.is_none() {
            self.pool_dump = Some(PoolSnapshotDumper::create(
                self.dump_dir.join("pools_snapshot.json"),
            )?);
        }
        let pools = self.engine.pools_snapshot();
        let segments = self.engine.segments_snapshot();
        self.pool_dump
            .as_mut()
            .expect("just created")
            .record(op, &pools, &segments)?;
        Ok(())
    }
}
