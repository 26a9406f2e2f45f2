/*!
 * Block Module
 * Blocks, the arena that owns them, the two ordered pools, and the
 * split/merge primitives over neighbour links
 */

mod arena;
mod graph;
mod pool;
mod types;

pub use arena::{BlockArena, BlockId};
pub use graph::{split_block, try_merge};
pub use pool::BlockPool;
pub use types::{Block, PoolKey, PoolKind};
