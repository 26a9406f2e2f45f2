/*!
 * Allocator Stats
 *
 * Running current/peak/total counters over blocks, segments, and byte
 * volumes. Off by default; the controller's profiling mode switches it on.
 */

use crate::core::types::Size;
use serde::{Deserialize, Serialize};

/// One tracked metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Status {
    /// Live amount right now
    pub current: i64,
    /// High-water mark of `current`
    pub peak: i64,
    /// Cumulative additions
    pub allocated: u64,
    /// Cumulative removals
    pub freed: u64,
}

impl Status {
    /// Apply a signed delta and fold it into the cumulative totals
    pub fn update(&mut self, amount: i64) {
        self.current += amount;
        self.peak = self.peak.max(self.current);
        if amount > 0 {
            self.allocated += amount as u64;
        } else {
            self.freed += (-amount) as u64;
        }
    }
}

/// Aggregate allocator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AllocatorStats {
    pub blocks: Status,
    pub segments: Status,
    pub allocated_bytes: Status,
    pub reserved_bytes: Status,
}

impl AllocatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_block_allocate(&mut self, size: Size) {
        self.blocks.update(1);
        self.allocated_bytes.update(size as i64);
    }

    pub fn on_block_free(&mut self, size: Size) {
        self.blocks.update(-1);
        self.allocated_bytes.update(-(size as i64));
    }

    pub fn on_segment_create(&mut self, size: Size) {
        self.segments.update(1);
        self.reserved_bytes.update(size as i64);
    }

    pub fn on_segment_release(&mut self, size: Size) {
        self.segments.update(-1);
        self.reserved_bytes.update(-(size as i64));
    }
}
