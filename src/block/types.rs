/*!
 * Block Types
 * The unit of reuse and its pool ordering key
 */

use super::arena::BlockId;
use crate::core::types::{Address, DeviceId, Size, StreamId};
use serde::{Deserialize, Serialize};

/// Which of the two pools a block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Small,
    Large,
}

impl PoolKind {
    pub fn is_small(self) -> bool {
        matches!(self, PoolKind::Small)
    }
}

/// One contiguous byte range within a segment
///
/// Neighbour links tie together the blocks split from a single segment;
/// the left-most block of a chain holds the segment's base address.
#[derive(Debug, Clone)]
pub struct Block {
    pub device: DeviceId,
    pub stream: StreamId,
    /// Block size in bytes
    pub size: Size,
    /// Owning pool
    pub pool: PoolKind,
    /// Synthetic device address
    pub ptr: Address,
    /// In-use flag
    pub allocated: bool,
    /// Previous block if split from a larger segment
    pub prev: Option<BlockId>,
    /// Next block if split from a larger segment
    pub next: Option<BlockId>,
    /// Counter prioritizing older blocks for cache collection
    pub gc_count: u32,
}

impl Block {
    pub fn new(device: DeviceId, stream: StreamId, size: Size, pool: PoolKind, ptr: Address) -> Self {
        Self {
            device,
            stream,
            size,
            pool,
            ptr,
            allocated: false,
            prev: None,
            next: None,
            gc_count: 0,
        }
    }

    /// A block is split iff it has at least one neighbour
    pub fn is_split(&self) -> bool {
        self.prev.is_some() || self.next.is_some()
    }

    /// Pool ordering key for this block
    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            stream: self.stream,
            size: self.size,
            ptr: self.ptr,
        }
    }
}

/// Pool ordering key: (stream, size, address) lexicographic
///
/// Addresses are unique, so equal keys never collide in a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PoolKey {
    pub stream: StreamId,
    pub size: Size,
    pub ptr: Address,
}

impl PoolKey {
    /// Search key for a lower-bound lookup: address pinned to zero so the
    /// scan starts at the smallest adequate block
    pub fn search(stream: StreamId, size: Size) -> Self {
        Self {
            stream,
            size,
            ptr: 0,
        }
    }
}
