/*!
 * Replay Types
 * The in-memory trace model and its error taxonomy
 */

use crate::core::types::{Address, OpId, Size};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Trace operation result
pub type TraceResult<T> = Result<T, TraceError>;

/// Malformed-trace errors; replay aborts and the previous best is preserved
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceError {
    #[error("free at op {op} for pointer {ptr:#x} with no live malloc")]
    FreeBeforeMalloc { op: OpId, ptr: Address },

    #[error("malloc at op {op} reuses still-active pointer {ptr:#x}")]
    PointerStillActive { op: OpId, ptr: Address },

    #[error("duplicate malloc op id {op}")]
    DuplicateMallocOp { op: OpId },

    #[error("two trace events share op id {op}")]
    OpIdCollision { op: OpId },

    #[error("free event at op {op} has no live block to release")]
    DanglingPointer { op: OpId },
}

/// Non-block API events carried by a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEvent {
    EmptyCache,
}

impl ApiEvent {
    /// Stable numeric code used by the trace dump
    pub fn code(self) -> u32 {
        match self {
            ApiEvent::EmptyCache => 0,
        }
    }
}

/// One completed block: malloc op paired with its free op and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TraceEntry {
    pub free_op: OpId,
    pub size: Size,
}

/// A single event as the replayer consumes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayEvent {
    Malloc { free_op: OpId, size: Size },
    Free { malloc_op: OpId },
    Api(ApiEvent),
}

/// Recorded event stream: completed blocks keyed by malloc op id, plus
/// API events, under one monotonic op order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    blocks: BTreeMap<OpId, TraceEntry>,
    apis: BTreeMap<OpId, ApiEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed block; duplicate malloc op ids are malformed
    pub fn insert_block(&mut self, malloc_op: OpId, entry: TraceEntry) -> TraceResult<()> {
        if self.blocks.contains_key(&malloc_op) {
            return Err(TraceError::DuplicateMallocOp { op: malloc_op });
        }
        self.blocks.insert(malloc_op, entry);
        Ok(())
    }

    /// Record a non-block API event
    pub fn insert_api(&mut self, op: OpId, event: ApiEvent) {
        self.apis.insert(op, event);
    }

    /// Completed blocks in malloc-op order
    pub fn blocks(&self) -> impl Iterator<Item = (&OpId, &TraceEntry)> {
        self.blocks.iter()
    }

    /// API events in op order
    pub fn apis(&self) -> impl Iterator<Item = (&OpId, &ApiEvent)> {
        self.apis.iter()
    }

    /// Number of completed blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.apis.is_empty()
    }

    /// Distinct recorded sizes strictly above `threshold`, ascending
    ///
    /// This is the empirical distribution the grouping synthesis scans.
    pub fn distinct_sizes_above(&self, threshold: Size) -> BTreeSet<Size> {
        self.blocks
            .values()
            .filter(|entry| entry.size > threshold)
            .map(|entry| entry.size)
            .collect()
    }

    /// Merge blocks and API events into one op-ordered event list
    pub fn ordered_events(&self) -> TraceResult<Vec<(OpId, ReplayEvent)>> {
        let mut merged: BTreeMap<OpId, ReplayEvent> = BTreeMap::new();

        for (&malloc_op, entry) in &self.blocks {
            if merged
                .insert(
                    malloc_op,
                    ReplayEvent::Malloc {
                        free_op: entry.free_op,
                        size: entry.size,
                    },
                )
                .is_some()
            {
                return Err(TraceError::OpIdCollision { op: malloc_op });
            }
            if merged
                .insert(entry.free_op, ReplayEvent::Free { malloc_op })
                .is_some()
            {
                return Err(TraceError::OpIdCollision { op: entry.free_op });
            }
        }
        for (&op, &event) in &self.apis {
            if merged.insert(op, ReplayEvent::Api(event)).is_some() {
                return Err(TraceError::OpIdCollision { op });
            }
        }

        Ok(merged.into_iter().collect())
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.apis.clear();
    }
}
