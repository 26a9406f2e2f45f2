/*!
 * Core Types
 * Common types used across the simulator
 */

/// Synthetic device address
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// Device ordinal
pub type DeviceId = u32;

/// Allocation stream ordinal
pub type StreamId = u32;

/// Monotonic operation id ordering every trace event
pub type OpId = u64;
