/*!
 * Caching Allocator Simulator
 * Block-pool replay engine and configuration autotuner for GPU caching
 * allocators, exposed as a library
 */

pub mod address_space;
pub mod block;
pub mod config;
pub mod controller;
pub mod core;
pub mod engine;
pub mod replay;
pub mod tuner;

// Re-exports
pub use config::{AllocatorConfig, ConfigStore, GroupBoundaries};
pub use controller::{Controller, ModeFlag};
pub use engine::{CacheEngine, CachingAllocator, MemoryUsage};
pub use replay::{ApiEvent, Replayer, Trace, TraceRecorder, TraceSource};
pub use tuner::{TuneResult, Tuner};
