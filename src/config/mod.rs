/*!
 * Allocator Configuration
 *
 * The six tunable size constants, the reserved future knobs, the adaptive
 * grouping boundaries, and the derived helpers (`round_size`,
 * `allocation_size`, `pool_for`) that the engine consults on every request.
 */

mod groups;
mod traits;
mod types;

pub use groups::GroupBoundaries;
pub use traits::{BestConfig, ConfigStore, PersistError, PersistResult};
pub use types::{ConfigError, ConfigResult};

use crate::block::PoolKind;
use crate::core::limits::{
    DEFAULT_GC_THRESHOLD, DEFAULT_LARGE_BUFFER, DEFAULT_MAX_SPLIT_SIZE, DEFAULT_MIN_BLOCK_SIZE,
    DEFAULT_MIN_LARGE_ALLOC, DEFAULT_ROUNDUP_BYPASS_THRESHOLD, DEFAULT_ROUNDUP_POWER2_DIVISIONS,
    DEFAULT_ROUND_LARGE, DEFAULT_SMALL_BUFFER, DEFAULT_SMALL_SIZE,
};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round `size` up to the next multiple of `quantum`
#[inline]
fn round_up(size: Size, quantum: Size) -> Size {
    quantum * ((size + quantum - 1) / quantum)
}

/// Tunable allocator configuration
///
/// The first six fields form the searched knob space; the remaining knobs
/// are reserved for future tuning and keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AllocatorConfig {
    /// Smallest block granularity; every rounded request is a multiple
    pub min_block_size: Size,
    /// Largest request served from the small pool
    pub small_size: Size,
    /// Segment size reserved on a small-pool miss
    pub small_buffer: Size,
    /// Segment size reserved on a modest large-pool miss
    pub large_buffer: Size,
    /// Requests at or above this get their own rounded segment
    pub min_large_alloc: Size,
    /// Rounding quantum for oversized segments
    pub round_large: Size,

    /// Oversize-guard threshold (reserved; max = guard off)
    pub max_split_size: Size,
    /// Power-of-two subdivision count for mid-range rounding (reserved)
    pub roundup_power2_divisions: Size,
    /// Requests past this bypass power-of-two rounding (reserved)
    pub roundup_bypass_threshold: Size,
    /// Cached-block collection trigger ratio (reserved; 0.0 = stub off)
    pub garbage_collection_threshold: f64,

    /// Adaptive large-allocation group boundaries
    pub groups: GroupBoundaries,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            small_size: DEFAULT_SMALL_SIZE,
            small_buffer: DEFAULT_SMALL_BUFFER,
            large_buffer: DEFAULT_LARGE_BUFFER,
            min_large_alloc: DEFAULT_MIN_LARGE_ALLOC,
            round_large: DEFAULT_ROUND_LARGE,
            max_split_size: DEFAULT_MAX_SPLIT_SIZE,
            roundup_power2_divisions: DEFAULT_ROUNDUP_POWER2_DIVISIONS,
            roundup_bypass_threshold: DEFAULT_ROUNDUP_BYPASS_THRESHOLD,
            garbage_collection_threshold: DEFAULT_GC_THRESHOLD,
            groups: GroupBoundaries::unset(),
        }
    }
}

impl AllocatorConfig {
    /// Configuration with the six knobs replaced and everything else default
    pub fn with_knobs(knobs: [Size; 6]) -> Self {
        Self {
            min_block_size: knobs[0],
            small_size: knobs[1],
            small_buffer: knobs[2],
            large_buffer: knobs[3],
            min_large_alloc: knobs[4],
            round_large: knobs[5],
            ..Self::default()
        }
    }

    /// The six searched knobs, in persistence order
    pub fn knobs(&self) -> [Size; 6] {
        [
            self.min_block_size,
            self.small_size,
            self.small_buffer,
            self.large_buffer,
            self.min_large_alloc,
            self.round_large,
        ]
    }

    /// Configuration validity: a large-pool miss below `min_large_alloc`
    /// reserves `large_buffer`, so the boundary must sit strictly below it
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_large_alloc >= self.large_buffer {
            return Err(ConfigError::MinLargeAllocTooLarge {
                min_large_alloc: self.min_large_alloc,
                large_buffer: self.large_buffer,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Replace `min_large_alloc`, rejecting values that violate validity
    pub fn set_min_large_alloc(&mut self, value: Size) -> ConfigResult<()> {
        if value >= self.large_buffer {
            return Err(ConfigError::MinLargeAllocTooLarge {
                min_large_alloc: value,
                large_buffer: self.large_buffer,
            });
        }
        self.min_large_alloc = value;
        Ok(())
    }

    /// Replace `large_buffer`, rejecting values that violate validity
    pub fn set_large_buffer(&mut self, value: Size) -> ConfigResult<()> {
        if self.min_large_alloc >= value {
            return Err(ConfigError::MinLargeAllocTooLarge {
                min_large_alloc: self.min_large_alloc,
                large_buffer: value,
            });
        }
        self.large_buffer = value;
        Ok(())
    }

    /// Size-class rounding applied to every incoming request
    pub fn round_size(&self, size: Size) -> Size {
        if size < self.min_block_size {
            self.min_block_size
        } else if size > self.roundup_bypass_threshold {
            round_up(size, self.min_block_size)
        } else {
            let divisions = self.roundup_power2_divisions;
            if divisions > 0 && size > self.min_block_size * divisions {
                // Power-of-two subdivision is reserved; the size passes
                // through verbatim so the knob stays a total function
                size
            } else {
                round_up(size, self.min_block_size)
            }
        }
    }

    /// Segment size to reserve when a request misses the cache
    ///
    /// With grouping live, large requests snap to the first boundary
    /// strictly greater than the size; sentinel slots fall through to
    /// `round_large` rounding.
    pub fn allocation_size(&self, size: Size, grouping: bool) -> Size {
        if grouping && size > self.large_buffer {
            return match self.groups.boundary_above(size) {
                Some(boundary) => boundary,
                None => round_up(size, self.round_large),
            };
        }
        if size <= self.small_size {
            self.small_buffer
        } else if size < self.min_large_alloc {
            self.large_buffer
        } else {
            round_up(size, self.round_large)
        }
    }

    /// Which pool serves a rounded request
    pub fn pool_for(&self, size: Size) -> PoolKind {
        if size <= self.small_size {
            PoolKind::Small
        } else {
            PoolKind::Large
        }
    }
}

impl fmt::Display for AllocatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min_block={} small={} small_buf={} large_buf={} min_large={} round_large={}",
            self.min_block_size,
            self.small_size,
            self.small_buffer,
            self.large_buffer,
            self.min_large_alloc,
            self.round_large
        )
    }
}
