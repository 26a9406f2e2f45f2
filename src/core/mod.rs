/*!
 * Core Module
 * Shared types, limits, and formatting helpers
 */

pub mod format;
pub mod limits;
pub mod timer;
pub mod types;

pub use format::format_size;
pub use timer::StageTimer;
pub use types::{Address, DeviceId, OpId, Size, StreamId};
