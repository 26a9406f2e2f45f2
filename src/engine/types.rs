/*!
 * Engine Types
 */

use crate::block::PoolKind;
use crate::core::types::{Address, DeviceId, Size, StreamId};
use serde::{Deserialize, Serialize};

/// Snapshot of the four usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryUsage {
    pub current_allocated: Size,
    pub peak_allocated: Size,
    pub current_reserved: Size,
    pub peak_reserved: Size,
}

impl MemoryUsage {
    /// Peak tuple in (allocated, reserved) order
    pub fn peaks(&self) -> (Size, Size) {
        (self.peak_allocated, self.peak_reserved)
    }
}

/// Ephemeral parameters of one allocation attempt
#[derive(Debug, Clone, Copy)]
pub struct AllocParams {
    pub device: DeviceId,
    pub stream: StreamId,
    /// Request size after size-class rounding
    pub size: Size,
    /// Target pool
    pub pool: PoolKind,
    /// Segment size to reserve on a miss
    pub alloc_size: Size,
}

/// Free-pool member as captured by the debug snapshot dump
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BlockSnapshot {
    pub ptr: Address,
    pub size: Size,
    pub stream: StreamId,
    pub split: bool,
}

/// Free-pool contents at one moment, in comparator order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolsSnapshot {
    pub small: Vec<BlockSnapshot>,
    pub large: Vec<BlockSnapshot>,
}
