/*!
 * Block Graph Primitives
 *
 * Split and merge over the neighbour links of a segment chain. Both keep
 * the invariants the rest of the engine leans on: links stay symmetric and
 * neighbouring address ranges stay exactly adjacent.
 */

use super::arena::{BlockArena, BlockId};
use super::pool::BlockPool;
use super::types::Block;
use crate::core::types::Size;
use log::trace;

/// Carve an exact-`size` left block out of `tail` and hand the left piece
/// to the caller; `tail` shrinks, shifts right, and re-enters the pool.
///
/// Preconditions: `tail` is free, not pooled, and strictly larger than
/// `size`.
pub fn split_block(arena: &mut BlockArena, pool: &mut BlockPool, tail: BlockId, size: Size) -> BlockId {
    let (device, stream, ptr, prev, tail_size, kind) = {
        let b = arena.get(tail);
        debug_assert!(!b.allocated, "splitting an allocated block");
        debug_assert!(b.size > size, "split size must leave a remainder");
        (b.device, b.stream, b.ptr, b.prev, b.size, b.pool)
    };

    let mut left = Block::new(device, stream, size, kind, ptr);
    left.prev = prev;
    left.next = Some(tail);
    let left_id = arena.insert(left);

    if let Some(prev_id) = prev {
        arena.get_mut(prev_id).next = Some(left_id);
    }

    let tail_block = arena.get_mut(tail);
    tail_block.prev = Some(left_id);
    tail_block.ptr = ptr + size;
    tail_block.size = tail_size - size;
    let tail_key = tail_block.pool_key();

    let inserted = pool.insert(tail_key, tail);
    debug_assert!(inserted, "split remainder collided with a pooled block");

    trace!("split {tail}: {size} bytes at {ptr:#x}, remainder {}", tail_size - size);
    left_id
}

/// Fuse `src` into `dst` when `src` is a free neighbour
///
/// `src` is spliced out of the chain, removed from its pool, and destroyed;
/// returns the subsumed size (0 when no merge happened).
pub fn try_merge(
    arena: &mut BlockArena,
    pool: &mut BlockPool,
    dst: BlockId,
    src: Option<BlockId>,
) -> Size {
    let src = match src {
        Some(id) => id,
        None => return 0,
    };
    if arena.get(src).allocated {
        return 0;
    }

    let src_key = arena.get(src).pool_key();
    let (src_ptr, src_prev, src_next, src_size) = {
        let b = arena.get(src);
        (b.ptr, b.prev, b.next, b.size)
    };

    if arena.get(dst).prev == Some(src) {
        // [src dst]
        let dst_block = arena.get_mut(dst);
        dst_block.ptr = src_ptr;
        dst_block.prev = src_prev;
        if let Some(prev_id) = src_prev {
            arena.get_mut(prev_id).next = Some(dst);
        }
    } else {
        // [dst src]
        debug_assert_eq!(arena.get(dst).next, Some(src), "merge candidate is not a neighbour");
        let dst_block = arena.get_mut(dst);
        dst_block.next = src_next;
        if let Some(next_id) = src_next {
            arena.get_mut(next_id).prev = Some(dst);
        }
    }

    arena.get_mut(dst).size += src_size;

    let removed = pool.remove(&src_key);
    debug_assert!(removed.is_some(), "merged block was not pooled");
    arena.remove(src);

    trace!("merged {src} into {dst}: +{src_size} bytes");
    src_size
}
