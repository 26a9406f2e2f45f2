/*!
 * Trace Recorder
 *
 * Asynchronous collection: malloc/free events arrive tagged with host
 * pointers; per-pointer bookkeeping pairs each free with its malloc op and
 * files the completed block into the trace.
 */

use super::types::{ApiEvent, Trace, TraceEntry, TraceError, TraceResult};
use crate::core::types::{Address, OpId, Size};
use ahash::RandomState;
use log::debug;
use std::collections::HashMap;

/// Accumulates an event stream into a replayable trace
#[derive(Debug, Default)]
pub struct TraceRecorder {
    /// Live pointers: ptr -> (malloc op, size)
    active: HashMap<Address, (OpId, Size), RandomState>,
    trace: Trace,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a malloc of `size` bytes observed at `ptr`
    pub fn record_malloc(&mut self, op: OpId, ptr: Address, size: Size) -> TraceResult<()> {
        if self.active.contains_key(&ptr) {
            return Err(TraceError::PointerStillActive { op, ptr });
        }
        self.active.insert(ptr, (op, size));
        Ok(())
    }

    /// Record a free of `ptr`, completing its trace entry
    pub fn record_free(&mut self, op: OpId, ptr: Address) -> TraceResult<()> {
        let (malloc_op, size) = self
            .active
            .remove(&ptr)
            .ok_or(TraceError::FreeBeforeMalloc { op, ptr })?;
        self.trace.insert_block(malloc_op, TraceEntry { free_op: op, size })
    }

    /// Record a non-block API event
    pub fn record_api(&mut self, op: OpId, event: ApiEvent) {
        self.trace.insert_api(op, event);
    }

    /// Close the trace: pointers still live get synthesised free events at
    /// sequential op ids starting from `first_op`. Returns the next unused
    /// op id so the caller's counter stays monotonic.
    pub fn close(&mut self, first_op: OpId) -> TraceResult<OpId> {
        if self.active.is_empty() {
            return Ok(first_op);
        }

        // Drain in malloc-op order so the synthesised tail is deterministic
        let mut live: Vec<(Address, (OpId, Size))> = self.active.drain().collect();
        live.sort_by_key(|&(_, (malloc_op, _))| malloc_op);

        debug!("closing trace: synthesising {} free events", live.len());
        let mut next_op = first_op;
        for (_, (malloc_op, size)) in live {
            self.trace
                .insert_block(malloc_op, TraceEntry { free_op: next_op, size })?;
            next_op += 1;
        }
        Ok(next_op)
    }

    /// Pointers still awaiting their free
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Completed blocks recorded so far
    pub fn recorded_count(&self) -> usize {
        self.trace.len()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Hand the accumulated trace over, leaving the recorder empty
    pub fn take_trace(&mut self) -> Trace {
        self.active.clear();
        std::mem::take(&mut self.trace)
    }

    /// Drop completed entries but keep live-pointer bookkeeping
    ///
    /// Pointers often outlive an iteration boundary; forgetting them would
    /// turn their eventual frees into malformed events.
    pub fn discard_completed(&mut self) {
        self.trace.clear();
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.trace.clear();
    }
}
