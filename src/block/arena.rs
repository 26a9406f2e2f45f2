/*!
 * Block Arena
 *
 * Slab storage giving every live block exactly one owner. Neighbour links
 * are `BlockId` indices into the arena, never references, so the doubly
 * linked segment chains stay cycle-safe: erasing a slot invalidates the id
 * and the debug invariant sweep catches any stale link.
 */

use super::types::Block;
use std::fmt;

/// Opaque arena index naming a live block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Single-owner storage for blocks
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    slots: Vec<Option<Block>>,
    free_slots: Vec<u32>,
    live: usize,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block, recycling a vacated slot when one exists
    pub fn insert(&mut self, block: Block) -> BlockId {
        self.live += 1;
        match self.free_slots.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(block);
                BlockId(idx)
            }
            None => {
                self.slots.push(Some(block));
                BlockId((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Remove and return a block, vacating its slot
    pub fn remove(&mut self, id: BlockId) -> Block {
        let block = self.slots[id.0 as usize]
            .take()
            .expect("removing a block that is not live");
        self.free_slots.push(id.0);
        self.live -= 1;
        block
    }

    pub fn get(&self, id: BlockId) -> &Block {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("dangling block id")
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Block {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("dangling block id")
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.slots
            .get(id.0 as usize)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Number of live blocks
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live blocks with their ids
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|b| (BlockId(idx as u32), b)))
    }

    /// Drop every block
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.live = 0;
    }
}
