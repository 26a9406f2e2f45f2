/*!
 * Candidate Sets
 *
 * Finite explicit candidate lists per knob, spanning roughly 0.5x to 16x
 * of the defaults, enumerated in ascending order so ties resolve to the
 * lexicographically smallest knob tuple.
 */

use crate::config::{ConfigError, ConfigResult};
use crate::core::types::Size;

pub const MIN_BLOCK_SIZE_CANDIDATES: [Size; 5] = [256, 512, 1024, 2048, 4096];

pub const SMALL_SIZE_CANDIDATES: [Size; 4] = [524_288, 1_048_576, 1_572_864, 2_097_152];

pub const SMALL_BUFFER_CANDIDATES: [Size; 5] =
    [2_097_152, 4_194_304, 6_291_456, 8_388_608, 10_485_760];

pub const LARGE_BUFFER_CANDIDATES: [Size; 5] =
    [10_485_760, 20_971_520, 31_457_280, 41_943_040, 52_428_800];

pub const MIN_LARGE_ALLOC_CANDIDATES: [Size; 5] =
    [20_971_520, 41_943_040, 62_914_560, 83_886_080, 104_857_600];

pub const ROUND_LARGE_CANDIDATES: [Size; 6] =
    [2_097_152, 4_194_304, 8_388_608, 16_777_216, 20_971_520, 25_165_824];

/// Difference ratios tried by the grouping synthesis
pub const GROUP_DELTAS: [f64; 5] = [0.2, 0.6, 1.2, 1.6, 2.0];

/// Knob names in enumeration (and persistence) order
pub const KNOB_NAMES: [&str; 6] = [
    "min_block_size",
    "small_size",
    "small_buffer",
    "large_buffer",
    "min_large_alloc",
    "round_large",
];

/// Reject a knob tuple containing values outside the declared sets
pub fn validate_knobs(knobs: &[Size; 6]) -> ConfigResult<()> {
    let sets: [&[Size]; 6] = [
        &MIN_BLOCK_SIZE_CANDIDATES,
        &SMALL_SIZE_CANDIDATES,
        &SMALL_BUFFER_CANDIDATES,
        &LARGE_BUFFER_CANDIDATES,
        &MIN_LARGE_ALLOC_CANDIDATES,
        &ROUND_LARGE_CANDIDATES,
    ];
    for (i, (&value, set)) in knobs.iter().zip(sets).enumerate() {
        if !set.contains(&value) {
            return Err(ConfigError::OutsideCandidateSet {
                knob: KNOB_NAMES[i],
                value,
            });
        }
    }
    Ok(())
}

/// Every knob tuple of the six-way product, in lexicographic order
pub fn knob_sets() -> Vec<[Size; 6]> {
    let mut sets = Vec::with_capacity(
        MIN_BLOCK_SIZE_CANDIDATES.len()
            * SMALL_SIZE_CANDIDATES.len()
            * SMALL_BUFFER_CANDIDATES.len()
            * LARGE_BUFFER_CANDIDATES.len()
            * MIN_LARGE_ALLOC_CANDIDATES.len()
            * ROUND_LARGE_CANDIDATES.len(),
    );
    for &min_block_size in &MIN_BLOCK_SIZE_CANDIDATES {
        for &small_size in &SMALL_SIZE_CANDIDATES {
            for &small_buffer in &SMALL_BUFFER_CANDIDATES {
                for &large_buffer in &LARGE_BUFFER_CANDIDATES {
                    for &min_large_alloc in &MIN_LARGE_ALLOC_CANDIDATES {
                        for &round_large in &ROUND_LARGE_CANDIDATES {
                            sets.push([
                                min_block_size,
                                small_size,
                                small_buffer,
                                large_buffer,
                                min_large_alloc,
                                round_large,
                            ]);
                        }
                    }
                }
            }
        }
    }
    sets
}
