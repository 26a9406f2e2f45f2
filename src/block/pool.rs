/*!
 * Block Pools
 *
 * The two ordered sets of currently-free blocks, keyed by
 * (stream, size, address). Lookup is a lower-bound scan from a search key
 * with the address pinned to zero, so the first hit is the smallest block
 * of adequate size on the stream.
 */

use super::arena::BlockId;
use super::types::{PoolKey, PoolKind};
use crate::core::types::{Size, StreamId};
use std::collections::BTreeMap;

/// Ordered set of free blocks
#[derive(Debug, Clone)]
pub struct BlockPool {
    kind: PoolKind,
    blocks: BTreeMap<PoolKey, BlockId>,
}

impl BlockPool {
    pub fn new(kind: PoolKind) -> Self {
        Self {
            kind,
            blocks: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Insert a free block under its key
    ///
    /// Returns false when the key was already present (addresses are unique,
    /// so a collision is a logic error surfaced by the caller's debug sweep).
    pub fn insert(&mut self, key: PoolKey, id: BlockId) -> bool {
        self.blocks.insert(key, id).is_none()
    }

    /// Remove a block by its key
    pub fn remove(&mut self, key: &PoolKey) -> Option<BlockId> {
        self.blocks.remove(key)
    }

    /// Lower-bound lookup: smallest block with key >= (stream, size, 0)
    ///
    /// The caller still checks the stream and the oversize guard; ordering
    /// guarantees the size fits whenever the stream matches.
    pub fn lower_bound(&self, stream: StreamId, size: Size) -> Option<(PoolKey, BlockId)> {
        let search = PoolKey::search(stream, size);
        self.blocks
            .range(search..)
            .next()
            .map(|(&key, &id)| (key, id))
    }

    pub fn contains(&self, key: &PoolKey) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate (key, id) pairs in comparator order
    pub fn iter(&self) -> impl Iterator<Item = (&PoolKey, &BlockId)> {
        self.blocks.iter()
    }

    /// Snapshot the member ids in comparator order
    ///
    /// Used by cache release, which erases members while walking.
    pub fn member_ids(&self) -> Vec<BlockId> {
        self.blocks.values().copied().collect()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
