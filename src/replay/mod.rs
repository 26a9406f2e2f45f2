/*!
 * Trace Replay
 *
 * Turns a recorded event stream into an ordered replay against the engine
 * and measures peak usage. Replay is reproducible: the same trace under the
 * same configuration yields bit-identical peak counters.
 */

mod recorder;
mod traits;
mod types;

pub use recorder::TraceRecorder;
pub use traits::TraceSource;
pub use types::{ApiEvent, ReplayEvent, Trace, TraceEntry, TraceError, TraceResult};

use crate::address_space::AllocError;
use crate::block::BlockId;
use crate::core::types::{DeviceId, OpId, StreamId};
use crate::engine::{CachingAllocator, MemoryUsage};
use ahash::RandomState;
use log::trace;
use std::collections::HashMap;
use thiserror::Error;

/// Replay result
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Replay failures
///
/// The tuner treats `Alloc` as a dominated candidate and `Trace` as fatal
/// to the current search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Deterministic trace executor
pub struct Replayer;

impl Replayer {
    /// Run the full event stream against `allocator` and return its usage
    /// counters at the end.
    ///
    /// Malloc results are filed under their free op id; a free op with no
    /// live block aborts the replay as a malformed trace.
    pub fn replay<S, A>(
        source: &S,
        allocator: &mut A,
        device: DeviceId,
        stream: StreamId,
    ) -> ReplayResult<MemoryUsage>
    where
        S: TraceSource + ?Sized,
        A: CachingAllocator,
    {
        let events = source.ordered_events()?;
        trace!("replaying {} events", events.len());

        // Live blocks keyed by the op id of their pending free
        let mut live: HashMap<OpId, BlockId, RandomState> = HashMap::default();

        for (op, event) in events {
            match event {
                ReplayEvent::Malloc { free_op, size } => {
                    let id = allocator.malloc(device, size, stream)?;
                    if live.insert(free_op, id).is_some() {
                        return Err(TraceError::OpIdCollision { op: free_op }.into());
                    }
                }
                ReplayEvent::Free { malloc_op: _ } => {
                    let id = live
                        .remove(&op)
                        .ok_or(TraceError::DanglingPointer { op })?;
                    allocator.free(id);
                }
                ReplayEvent::Api(ApiEvent::EmptyCache) => {
                    allocator.empty_cache();
                }
            }
        }

        let usage = allocator.usage();
        debug_assert!(
            usage.peak_reserved >= usage.peak_allocated,
            "reserved peak fell below allocated peak"
        );
        Ok(usage)
    }
}
