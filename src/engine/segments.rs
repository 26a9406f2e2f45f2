/*!
 * Segment Snapshots
 *
 * Point-in-time view of every live segment: its block layout, how much of
 * it is handed out, and a fragmentation score. Computed on demand by
 * walking the neighbour chains from each segment head.
 */

use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};

/// One block inside a segment snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BlockInfo {
    pub ptr: Address,
    pub size: Size,
    pub allocated: bool,
}

/// One live segment and its current layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SegmentSnapshot {
    /// Segment base address (the head block's address)
    pub address: Address,
    /// Total reserved bytes of the chain
    pub total_size: Size,
    /// Bytes currently handed out
    pub allocated_size: Size,
    /// Blocks in the chain
    pub num_blocks: usize,
    /// Handed-out blocks in the chain
    pub num_allocated_blocks: usize,
    /// Largest single free block
    pub largest_free_size: Size,
    /// 1 - largest_free / total_free; 0.0 for a fully-allocated segment
    pub fragmentation: f64,
    /// Per-block layout, left to right
    pub blocks: Vec<BlockInfo>,
}

impl SegmentSnapshot {
    /// Build a snapshot from the chain's blocks, left to right
    pub fn from_chain(blocks: Vec<BlockInfo>) -> Self {
        let address = blocks.first().map(|b| b.ptr).unwrap_or(0);
        let total_size: Size = blocks.iter().map(|b| b.size).sum();
        let allocated_size: Size = blocks.iter().filter(|b| b.allocated).map(|b| b.size).sum();
        let num_allocated_blocks = blocks.iter().filter(|b| b.allocated).count();
        let largest_free_size = blocks
            .iter()
            .filter(|b| !b.allocated)
            .map(|b| b.size)
            .max()
            .unwrap_or(0);

        let free_size = total_size - allocated_size;
        let fragmentation = if free_size > 0 {
            1.0 - (largest_free_size as f64) / (free_size as f64)
        } else {
            0.0
        };

        Self {
            address,
            total_size,
            allocated_size,
            num_blocks: blocks.len(),
            num_allocated_blocks,
            largest_free_size,
            fragmentation,
            blocks,
        }
    }
}
