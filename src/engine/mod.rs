/*!
 * Caching Allocator Engine
 *
 * Deterministic model of segment reservation, splitting, coalescing,
 * cached-block lookup, and cache release.
 *
 * ## Request path
 *
 * 1. Round the request to its size class and pick the pool
 * 2. Lower-bound probe of the pool under the oversize guard
 * 3. On a miss, reserve a fresh segment from the synthetic address space
 * 4. Split when the remainder is worth keeping; the tail re-enters the pool
 * 5. Hand out the block and advance the usage counters
 *
 * Reserved bytes only ever drop on `empty_cache`, which releases every
 * segment whose chain has coalesced back into a single free block.
 */

mod segments;
mod stats;
mod traits;
mod types;

pub use segments::{BlockInfo, SegmentSnapshot};
pub use stats::{AllocatorStats, Status};
pub use traits::CachingAllocator;
pub use types::{AllocParams, BlockSnapshot, MemoryUsage, PoolsSnapshot};

use crate::address_space::{AddressSpace, AllocResult};
use crate::block::{split_block, try_merge, Block, BlockArena, BlockId, BlockPool, PoolKind};
use crate::config::{AllocatorConfig, ConfigResult, GroupBoundaries};
use crate::core::format::format_size;
use crate::core::types::{DeviceId, Size, StreamId};
use log::{debug, info, trace};

/// The caching allocator state machine
#[derive(Debug, Clone)]
pub struct CacheEngine {
    arena: BlockArena,
    small_pool: BlockPool,
    large_pool: BlockPool,
    address_space: AddressSpace,
    config: AllocatorConfig,
    grouping: bool,
    current_allocated: Size,
    peak_allocated: Size,
    current_reserved: Size,
    peak_reserved: Size,
    stats: Option<AllocatorStats>,
}

impl CacheEngine {
    pub fn new() -> Self {
        Self::with_config(AllocatorConfig::default())
            .expect("default configuration is valid")
    }

    /// Engine with an explicit starting configuration
    pub fn with_config(config: AllocatorConfig) -> ConfigResult<Self> {
        Self::with_address_space(config, AddressSpace::new())
    }

    /// Engine over a device with finite memory
    pub fn with_capacity(config: AllocatorConfig, capacity: Size) -> ConfigResult<Self> {
        Self::with_address_space(config, AddressSpace::with_capacity(capacity))
    }

    fn with_address_space(config: AllocatorConfig, address_space: AddressSpace) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            arena: BlockArena::new(),
            small_pool: BlockPool::new(PoolKind::Small),
            large_pool: BlockPool::new(PoolKind::Large),
            address_space,
            config,
            grouping: false,
            current_allocated: 0,
            peak_allocated: 0,
            current_reserved: 0,
            peak_reserved: 0,
            stats: None,
        })
    }

    // =========================================================================
    // Configuration surface
    // =========================================================================

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Swap the configuration; rejected when it violates validity
    pub fn set_config(&mut self, config: AllocatorConfig) -> ConfigResult<()> {
        config.validate()?;
        debug!("engine config -> {config}");
        self.config = config;
        Ok(())
    }

    pub fn set_groups(&mut self, groups: GroupBoundaries) {
        self.config.groups = groups;
    }

    /// Toggle adaptive grouping of large allocation sizes
    pub fn set_grouping(&mut self, enabled: bool) {
        self.grouping = enabled;
    }

    pub fn grouping_enabled(&self) -> bool {
        self.grouping
    }

    /// Start tracking block/segment statistics
    pub fn enable_stats(&mut self) {
        if self.stats.is_none() {
            self.stats = Some(AllocatorStats::new());
        }
    }

    pub fn stats(&self) -> Option<&AllocatorStats> {
        self.stats.as_ref()
    }

    // =========================================================================
    // Allocation path
    // =========================================================================

    /// Serve a request, reusing a cached block or reserving a new segment
    pub fn malloc(
        &mut self,
        device: DeviceId,
        orig_size: Size,
        stream: StreamId,
    ) -> AllocResult<BlockId> {
        let size = self.config.round_size(orig_size);
        let pool = self.config.pool_for(size);
        let alloc_size = self.config.allocation_size(size, self.grouping);
        let params = AllocParams {
            device,
            stream,
            size,
            pool,
            alloc_size,
        };

        let id = match self.find_cached_block(&params) {
            Some(id) => id,
            None => self.reserve_segment(&params)?,
        };

        let id = if self.should_split(id, size) {
            self.split_for(id, size)
        } else {
            id
        };

        let block = self.arena.get_mut(id);
        block.allocated = true;
        let handed = block.size;
        self.current_allocated += handed;
        self.peak_allocated = self.peak_allocated.max(self.current_allocated);
        if let Some(stats) = self.stats.as_mut() {
            stats.on_block_allocate(handed);
        }
        trace!(
            "malloc {orig_size} -> {id} (size {handed}, allocated {}, reserved {})",
            self.current_allocated,
            self.current_reserved
        );

        #[cfg(debug_assertions)]
        self.verify_invariants();
        Ok(id)
    }

    /// Return a block to its pool, coalescing with free neighbours
    pub fn free(&mut self, id: BlockId) {
        let block = self.arena.get_mut(id);
        debug_assert!(block.allocated, "freeing a block that is not handed out");
        block.allocated = false;
        let orig_size = block.size;
        let kind = block.pool;
        let merge_candidates = [block.prev, block.next];

        for candidate in merge_candidates {
            let pool = match kind {
                PoolKind::Small => &mut self.small_pool,
                PoolKind::Large => &mut self.large_pool,
            };
            try_merge(&mut self.arena, pool, id, candidate);
        }

        let key = self.arena.get(id).pool_key();
        let pool = match kind {
            PoolKind::Small => &mut self.small_pool,
            PoolKind::Large => &mut self.large_pool,
        };
        let inserted = pool.insert(key, id);
        debug_assert!(inserted, "freed block collided with a pooled block");

        self.current_allocated -= orig_size;
        if let Some(stats) = self.stats.as_mut() {
            stats.on_block_free(orig_size);
        }
        trace!(
            "free {id} ({orig_size} bytes, allocated {}, reserved {})",
            self.current_allocated,
            self.current_reserved
        );

        #[cfg(debug_assertions)]
        self.verify_invariants();
    }

    /// Release every fully-coalesced cached segment back to the address space
    pub fn empty_cache(&mut self) {
        self.release_pool(PoolKind::Large);
        self.release_pool(PoolKind::Small);

        #[cfg(debug_assertions)]
        self.verify_invariants();
    }

    /// Zero the peak counters; current usage is untouched
    pub fn reset_peaks(&mut self) {
        self.peak_allocated = 0;
        self.peak_reserved = 0;
    }

    /// Snapshot the usage counters
    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            current_allocated: self.current_allocated,
            peak_allocated: self.peak_allocated,
            current_reserved: self.current_reserved,
            peak_reserved: self.peak_reserved,
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Borrow a live block
    pub fn block(&self, id: BlockId) -> &Block {
        self.arena.get(id)
    }

    /// Free blocks currently cached across both pools
    pub fn free_block_count(&self) -> usize {
        self.small_pool.len() + self.large_pool.len()
    }

    /// Live segments reserved from the address space
    pub fn segment_count(&self) -> usize {
        self.address_space.allocated_ranges()
    }

    /// Free-pool contents in comparator order
    pub fn pools_snapshot(&self) -> PoolsSnapshot {
        let capture = |pool: &BlockPool| {
            pool.iter()
                .map(|(_, &id)| {
                    let b = self.arena.get(id);
                    BlockSnapshot {
                        ptr: b.ptr,
                        size: b.size,
                        stream: b.stream,
                        split: b.is_split(),
                    }
                })
                .collect()
        };
        PoolsSnapshot {
            small: capture(&self.small_pool),
            large: capture(&self.large_pool),
        }
    }

    /// Layout of every live segment, ordered by base address
    ///
    /// Walks each neighbour chain from its head block; the sum of the
    /// snapshot totals always equals the reserved counter.
    pub fn segments_snapshot(&self) -> Vec<SegmentSnapshot> {
        let mut snapshots: Vec<SegmentSnapshot> = self
            .arena
            .iter()
            .filter(|(_, block)| block.prev.is_none())
            .map(|(head, _)| {
                let mut chain = Vec::new();
                let mut cursor = Some(head);
                while let Some(id) = cursor {
                    let b = self.arena.get(id);
                    chain.push(BlockInfo {
                        ptr: b.ptr,
                        size: b.size,
                        allocated: b.allocated,
                    });
                    cursor = b.next;
                }
                SegmentSnapshot::from_chain(chain)
            })
            .collect();
        snapshots.sort_by_key(|s| s.address);
        snapshots
    }

    /// Full structural invariant sweep; panics on violation
    ///
    /// Runs after every mutating operation in debug builds and is cheap
    /// enough for tests to call directly.
    pub fn verify_invariants(&self) {
        let mut total_bytes = 0;
        let mut allocated_bytes = 0;
        let mut free_small = 0;
        let mut free_large = 0;

        for (id, block) in self.arena.iter() {
            if let Some(prev) = block.prev {
                let prev_block = self.arena.get(prev);
                assert_eq!(prev_block.next, Some(id), "neighbour links asymmetric");
                assert_eq!(
                    prev_block.ptr + prev_block.size,
                    block.ptr,
                    "neighbour ranges not adjacent"
                );
            }
            if let Some(next) = block.next {
                assert_eq!(self.arena.get(next).prev, Some(id), "neighbour links asymmetric");
            }

            let pool = match block.pool {
                PoolKind::Small => &self.small_pool,
                PoolKind::Large => &self.large_pool,
            };
            if block.allocated {
                allocated_bytes += block.size;
                assert!(
                    !pool.contains(&block.pool_key()),
                    "handed-out block still pooled"
                );
            } else {
                assert!(
                    pool.contains(&block.pool_key()),
                    "free block missing from its pool"
                );
                match block.pool {
                    PoolKind::Small => free_small += 1,
                    PoolKind::Large => free_large += 1,
                }
            }
            total_bytes += block.size;
        }

        assert_eq!(free_small, self.small_pool.len(), "stale small-pool entries");
        assert_eq!(free_large, self.large_pool.len(), "stale large-pool entries");
        assert_eq!(
            total_bytes, self.current_reserved,
            "reserved counter diverged from segment bytes"
        );
        assert_eq!(
            allocated_bytes, self.current_allocated,
            "allocated counter diverged from live blocks"
        );
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Lower-bound pool probe under the oversize guard
    fn find_cached_block(&mut self, p: &AllocParams) -> Option<BlockId> {
        let max_split_size = self.config.max_split_size;
        let large_buffer = self.config.large_buffer;
        let pool = match p.pool {
            PoolKind::Small => &mut self.small_pool,
            PoolKind::Large => &mut self.large_pool,
        };

        let (key, id) = pool.lower_bound(p.stream, p.size)?;
        if key.stream != p.stream {
            return None;
        }
        // Oversize guard: past max_split_size, refuse a candidate that
        // exceeds the request by more than one large buffer
        if p.size >= max_split_size && key.size >= p.size + large_buffer {
            return None;
        }

        pool.remove(&key);
        self.arena.get_mut(id).gc_count = 0;
        Some(id)
    }

    /// Reserve a fresh segment from the address space
    fn reserve_segment(&mut self, p: &AllocParams) -> AllocResult<BlockId> {
        let ptr = self.address_space.allocate(p.alloc_size)?;
        let id = self
            .arena
            .insert(Block::new(p.device, p.stream, p.alloc_size, p.pool, ptr));

        self.current_reserved += p.alloc_size;
        self.peak_reserved = self.peak_reserved.max(self.current_reserved);
        if let Some(stats) = self.stats.as_mut() {
            stats.on_segment_create(p.alloc_size);
        }
        debug!(
            "reserved segment {} at {ptr:#x} (reserved {})",
            format_size(p.alloc_size),
            format_size(self.current_reserved)
        );
        Ok(id)
    }

    /// Split policy: keep the remainder when it is worth caching
    fn should_split(&self, id: BlockId, size: Size) -> bool {
        let block = self.arena.get(id);
        let remaining = block.size - size;
        match block.pool {
            PoolKind::Small => remaining >= self.config.min_block_size,
            PoolKind::Large => {
                size < self.config.max_split_size && remaining > self.config.small_size
            }
        }
    }

    fn split_for(&mut self, id: BlockId, size: Size) -> BlockId {
        let kind = self.arena.get(id).pool;
        let pool = match kind {
            PoolKind::Small => &mut self.small_pool,
            PoolKind::Large => &mut self.large_pool,
        };
        split_block(&mut self.arena, pool, id, size)
    }

    fn release_pool(&mut self, kind: PoolKind) {
        let candidates = match kind {
            PoolKind::Small => self.small_pool.member_ids(),
            PoolKind::Large => self.large_pool.member_ids(),
        };

        let mut released = 0usize;
        let mut released_bytes = 0;
        for id in candidates {
            let (whole, key, ptr, size) = {
                let b = self.arena.get(id);
                (
                    b.prev.is_none() && b.next.is_none(),
                    b.pool_key(),
                    b.ptr,
                    b.size,
                )
            };
            if !whole {
                continue;
            }

            let pool = match kind {
                PoolKind::Small => &mut self.small_pool,
                PoolKind::Large => &mut self.large_pool,
            };
            pool.remove(&key);
            self.address_space.free(ptr, size);
            self.current_reserved -= size;
            if let Some(stats) = self.stats.as_mut() {
                stats.on_segment_release(size);
            }
            self.arena.remove(id);
            released += 1;
            released_bytes += size;
        }

        if released > 0 {
            info!(
                "released {released} cached {:?}-pool segments ({})",
                kind,
                format_size(released_bytes)
            );
        }
    }
}

impl Default for CacheEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CachingAllocator for CacheEngine {
    fn malloc(&mut self, device: DeviceId, orig_size: Size, stream: StreamId) -> AllocResult<BlockId> {
        CacheEngine::malloc(self, device, orig_size, stream)
    }

    fn free(&mut self, id: BlockId) {
        CacheEngine::free(self, id)
    }

    fn empty_cache(&mut self) {
        CacheEngine::empty_cache(self)
    }

    fn reset_peaks(&mut self) {
        CacheEngine::reset_peaks(self)
    }

    fn usage(&self) -> MemoryUsage {
        CacheEngine::usage(self)
    }
}
