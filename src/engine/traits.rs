/*!
 * Engine Traits
 * The allocator capability the replayer and tuner program against
 */

use super::types::MemoryUsage;
use crate::address_space::AllocResult;
use crate::block::BlockId;
use crate::core::types::{DeviceId, Size, StreamId};

/// Caching allocator interface
pub trait CachingAllocator {
    /// Serve a request, reusing a cached block or reserving a new segment
    fn malloc(&mut self, device: DeviceId, orig_size: Size, stream: StreamId) -> AllocResult<BlockId>;

    /// Return a block to its pool, coalescing with free neighbours
    fn free(&mut self, id: BlockId);

    /// Release every fully-coalesced cached segment back to the address space
    fn empty_cache(&mut self);

    /// Zero the peak counters (current usage is untouched)
    fn reset_peaks(&mut self);

    /// Snapshot the usage counters
    fn usage(&self) -> MemoryUsage;
}
