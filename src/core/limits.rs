/*!
 * Simulator Limits and Constants
 *
 * Centralized location for the default tunable values and fixed thresholds.
 * Organized by domain for maintainability and discoverability.
 */

use super::types::{Address, Size};

// =============================================================================
// SIZE-CLASS DEFAULTS
// =============================================================================

/// Smallest block granularity (512B)
/// Every rounded request is a multiple of this
pub const DEFAULT_MIN_BLOCK_SIZE: Size = 512;

/// Largest request served from the small pool (1MB)
pub const DEFAULT_SMALL_SIZE: Size = 1_048_576;

/// Segment size reserved for small-pool misses (2MB)
pub const DEFAULT_SMALL_BUFFER: Size = 2_097_152;

/// Segment size reserved for modest large-pool misses (20MB)
pub const DEFAULT_LARGE_BUFFER: Size = 20_971_520;

/// Requests at or above this get their own rounded segment (10MB)
pub const DEFAULT_MIN_LARGE_ALLOC: Size = 10_485_760;

/// Rounding quantum for oversized segments (2MB)
pub const DEFAULT_ROUND_LARGE: Size = 2_097_152;

// =============================================================================
// RESERVED KNOBS
// =============================================================================

/// Requests past this size refuse wasteful cached-block reuse
/// Max sentinel disables the oversize guard entirely
pub const DEFAULT_MAX_SPLIT_SIZE: Size = Size::MAX;

/// Power-of-two subdivision count for mid-range rounding (0 = off)
pub const DEFAULT_ROUNDUP_POWER2_DIVISIONS: Size = 0;

/// Requests past this bypass the power-of-two rounding path
pub const DEFAULT_ROUNDUP_BYPASS_THRESHOLD: Size = Size::MAX;

/// Cached-block garbage collection trigger ratio (0.0 = collection stub off)
pub const DEFAULT_GC_THRESHOLD: f64 = 0.0;

// =============================================================================
// ADDRESS SPACE
// =============================================================================

/// First address handed out by the synthetic device address space
/// Nonzero so a zero pointer can keep meaning "search key"
pub const SEGMENT_BASE_ADDRESS: Address = 100;

// =============================================================================
// GROUPING
// =============================================================================

/// Number of adaptive large-allocation group boundaries
pub const GROUP_SLOTS: usize = 5;

/// Sentinel for an unset group boundary
pub const GROUP_UNSET: Size = Size::MAX;

// =============================================================================
// CONTROLLER LIFECYCLE
// =============================================================================

/// Iterations of trace accumulation before the profiling-mode search runs
pub const PROFILE_ITERATIONS: u64 = 2;
