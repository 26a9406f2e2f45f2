/*!
 * Split and Merge Tests
 * One segment carved into neighbours and fused back together
 */

use allocator_sim::engine::CacheEngine;
use pretty_assertions::assert_eq;

const KIB: usize = 1024;
const MIB: usize = 1_048_576;

#[test]
fn two_small_requests_share_one_segment() {
    let mut engine = CacheEngine::new();

    let a = engine.malloc(0, KIB, 0).unwrap();
    let b = engine.malloc(0, 2 * KIB, 0).unwrap();

    // Both carved from the same 2 MiB reservation
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.usage().current_reserved, 2 * MIB);
    assert_eq!(engine.usage().current_allocated, 3 * KIB);
    assert_eq!(engine.block(a).ptr + KIB, engine.block(b).ptr);
    assert!(engine.block(a).is_split());

    // Freeing both merges the chain back into a single cached block
    engine.free(a);
    engine.free(b);
    assert_eq!(engine.free_block_count(), 1);
    assert_eq!(engine.usage().current_allocated, 0);

    engine.empty_cache();
    let usage = engine.usage();
    assert_eq!(usage.current_reserved, 0);
    assert_eq!(usage.peak_reserved, 2 * MIB);
    assert_eq!(usage.peak_allocated, 3 * KIB);
}

#[test]
fn free_order_does_not_block_coalescing() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, KIB, 0).unwrap();
    let b = engine.malloc(0, KIB, 0).unwrap();
    let c = engine.malloc(0, KIB, 0).unwrap();

    // Free the middle block last so it bridges its two free neighbours
    // (c immediately merges with the segment tail)
    engine.free(a);
    engine.free(c);
    assert_eq!(engine.free_block_count(), 2);
    engine.free(b);
    assert_eq!(engine.free_block_count(), 1);

    engine.empty_cache();
    assert_eq!(engine.usage().current_reserved, 0);
}

#[test]
fn split_remainder_serves_the_next_request() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, 512 * KIB, 0).unwrap();
    let b = engine.malloc(0, 512 * KIB, 0).unwrap();
    let c = engine.malloc(0, 512 * KIB, 0).unwrap();
    let d = engine.malloc(0, 512 * KIB, 0).unwrap();

    // Four half-MiB requests fill the 2 MiB segment exactly
    assert_eq!(engine.segment_count(), 1);
    let base = engine.block(a).ptr;
    assert_eq!(engine.block(b).ptr, base + 512 * KIB);
    assert_eq!(engine.block(c).ptr, base + MIB);
    assert_eq!(engine.block(d).ptr, base + MIB + 512 * KIB);

    // A fifth one needs a fresh segment
    let _e = engine.malloc(0, 512 * KIB, 0).unwrap();
    assert_eq!(engine.segment_count(), 2);
}

#[test]
fn partial_free_keeps_the_segment_reserved() {
    let mut engine = CacheEngine::new();
    let a = engine.malloc(0, 256 * KIB, 0).unwrap();
    let b = engine.malloc(0, 256 * KIB, 0).unwrap();

    engine.free(a);
    engine.empty_cache();
    // The freed half cannot leave: its neighbour is still handed out
    assert_eq!(engine.usage().current_reserved, 2 * MIB);

    engine.free(b);
    engine.empty_cache();
    assert_eq!(engine.usage().current_reserved, 0);
}
