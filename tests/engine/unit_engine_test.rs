/*!
 * Engine Tests
 * Allocation paths, counters, cache release, and the oversize guard
 */

use allocator_sim::config::AllocatorConfig;
use allocator_sim::engine::CacheEngine;
use pretty_assertions::assert_eq;

const KIB: usize = 1024;
const MIB: usize = 1_048_576;

#[test]
fn small_request_reserves_one_small_segment() {
    let mut engine = CacheEngine::new();

    let block = engine.malloc(0, KIB, 0).unwrap();
    let usage = engine.usage();
    assert_eq!(usage.peak_allocated, KIB);
    assert_eq!(usage.current_allocated, KIB);
    assert_eq!(usage.peak_reserved, 2 * MIB);
    assert_eq!(usage.current_reserved, 2 * MIB);
    assert_eq!(engine.segment_count(), 1);

    engine.free(block);
    let usage = engine.usage();
    assert_eq!(usage.current_allocated, 0);
    assert_eq!(usage.current_reserved, 2 * MIB);
    assert_eq!(usage.peak_allocated, KIB);
    assert_eq!(usage.peak_reserved, 2 * MIB);

    engine.empty_cache();
    let usage = engine.usage();
    assert_eq!(usage.current_reserved, 0);
    assert_eq!(usage.peak_reserved, 2 * MIB);
    assert_eq!(engine.segment_count(), 0);
}

#[test]
fn requests_round_to_the_block_granularity() {
    let mut engine = CacheEngine::new();
    let block = engine.malloc(0, 1, 0).unwrap();
    assert_eq!(engine.block(block).size, 512);

    let block = engine.malloc(0, 513, 0).unwrap();
    assert_eq!(engine.block(block).size, KIB);
}

#[test]
fn three_mib_request_takes_the_large_buffer_path() {
    let mut engine = CacheEngine::new();

    let block = engine.malloc(0, 3 * MIB, 0).unwrap();
    assert_eq!(engine.block(block).size, 3 * MIB);
    let usage = engine.usage();
    assert_eq!(usage.peak_reserved, 20 * MIB);
    assert_eq!(usage.peak_reserved, 20_971_520);
    assert_eq!(usage.peak_allocated, 3 * MIB);
}

#[test]
fn cached_block_is_reused_across_a_free() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, 4 * KIB, 0).unwrap();
    let ptr = engine.block(a).ptr;
    engine.free(a);

    let b = engine.malloc(0, 4 * KIB, 0).unwrap();
    assert_eq!(engine.block(b).ptr, ptr);
    assert_eq!(engine.segment_count(), 1);
}

#[test]
fn streams_do_not_share_cached_blocks() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, 4 * KIB, 7).unwrap();
    engine.free(a);

    // Same size on another stream misses and reserves its own segment
    let _b = engine.malloc(0, 4 * KIB, 8).unwrap();
    assert_eq!(engine.segment_count(), 2);
}

#[test]
fn oversize_guard_rejects_wasteful_reuse() {
    let mut config = AllocatorConfig::default();
    config.max_split_size = 10 * MIB;
    let mut engine = CacheEngine::with_config(config).unwrap();

    // Prime the large pool with a 40 MiB segment
    let big = engine.malloc(0, 40 * MIB, 0).unwrap();
    engine.free(big);
    assert_eq!(engine.free_block_count(), 1);

    // 15 MiB is past max_split_size and 40 >= 15 + 20: candidate refused
    let _mid = engine.malloc(0, 15 * MIB, 0).unwrap();
    assert_eq!(engine.segment_count(), 2);
    assert_eq!(engine.usage().current_reserved, 40 * MIB + 16 * MIB);

    // 22 MiB is past max_split_size but 40 < 22 + 20: candidate accepted
    let reused = engine.malloc(0, 22 * MIB, 0).unwrap();
    assert_eq!(engine.block(reused).size, 40 * MIB);
    assert_eq!(engine.segment_count(), 2);
}

#[test]
fn address_space_exhaustion_surfaces_as_an_error() {
    let mut engine = CacheEngine::with_capacity(AllocatorConfig::default(), 3 * MIB).unwrap();

    // One small segment fits; the second does not
    let _a = engine.malloc(0, KIB, 0).unwrap();
    let err = engine.malloc(0, 2 * MIB, 0);
    assert!(err.is_err());
    // State is still consistent after the failure
    engine.verify_invariants();
}

#[test]
fn empty_cache_keeps_split_segments() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, KIB, 0).unwrap();
    let _b = engine.malloc(0, KIB, 0).unwrap();
    engine.free(a);

    // The segment still hosts an allocated block: nothing to release
    engine.empty_cache();
    assert_eq!(engine.usage().current_reserved, 2 * MIB);
    assert_eq!(engine.segment_count(), 1);
}

#[test]
fn grouping_changes_the_reservation_size() {
    use allocator_sim::config::GroupBoundaries;

    let mut engine = CacheEngine::new();
    engine.set_groups(GroupBoundaries::from_slots([
        34 * MIB,
        usize::MAX,
        usize::MAX,
        usize::MAX,
        usize::MAX,
    ]));
    engine.set_grouping(true);

    let block = engine.malloc(0, 30 * MIB, 0).unwrap();
    // The request itself stays 30 MiB, the segment snaps to the boundary
    assert_eq!(engine.block(block).size, 30 * MIB);
    assert_eq!(engine.usage().peak_reserved, 34 * MIB);
}

#[test]
fn segment_snapshot_walks_the_chain() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, KIB, 0).unwrap();
    let _b = engine.malloc(0, 2 * KIB, 0).unwrap();
    engine.free(a);

    let segments = engine.segments_snapshot();
    assert_eq!(segments.len(), 1);
    let segment = &segments[0];
    assert_eq!(segment.total_size, 2 * MIB);
    assert_eq!(segment.allocated_size, 2 * KIB);
    assert_eq!(segment.num_blocks, 3);
    assert_eq!(segment.num_allocated_blocks, 1);
    // Free space is the 1 KiB hole plus the tail; the tail dominates
    assert_eq!(segment.largest_free_size, 2 * MIB - 3 * KIB);
    assert!(segment.fragmentation > 0.0);
    // Layout is left to right and contiguous
    assert_eq!(segment.blocks.len(), 3);
    assert_eq!(segment.blocks[0].ptr + segment.blocks[0].size, segment.blocks[1].ptr);

    // Snapshot totals always agree with the reserved counter
    let total: usize = segments.iter().map(|s| s.total_size).sum();
    assert_eq!(total, engine.usage().current_reserved);
}

#[test]
fn stats_follow_segment_and_block_churn() {
    let mut engine = CacheEngine::new();
    engine.enable_stats();

    let a = engine.malloc(0, KIB, 0).unwrap();
    engine.free(a);
    engine.empty_cache();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.segments.peak, 1);
    assert_eq!(stats.segments.current, 0);
    assert_eq!(stats.blocks.peak, 1);
    assert_eq!(stats.blocks.current, 0);
    assert_eq!(stats.allocated_bytes.allocated, KIB as u64);
    assert_eq!(stats.reserved_bytes.freed, 2 * MIB as u64);
}
