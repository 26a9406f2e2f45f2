/*!
 * Replay Traits
 * Capability seam between recorded traces and the replayer
 */

use super::types::{ReplayEvent, Trace, TraceResult};
use crate::core::types::OpId;

/// Anything that can hand the replayer an op-ordered event stream
pub trait TraceSource {
    /// Events in strictly ascending op order
    fn ordered_events(&self) -> TraceResult<Vec<(OpId, ReplayEvent)>>;
}

impl TraceSource for Trace {
    fn ordered_events(&self) -> TraceResult<Vec<(OpId, ReplayEvent)>> {
        Trace::ordered_events(self)
    }
}
