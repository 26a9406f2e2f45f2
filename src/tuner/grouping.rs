/*!
 * Grouping Synthesis
 *
 * Derives the five large-allocation group boundaries from the empirical
 * size distribution of a trace: scan the distinct sizes ascending, start a
 * new group whenever the relative jump from the group's first size exceeds
 * the difference ratio, and close the previous group at its largest member.
 */

use crate::config::GroupBoundaries;
use crate::core::limits::GROUP_SLOTS;
use crate::core::types::Size;
use crate::replay::Trace;
use log::debug;

/// Synthesise boundaries for sizes above `threshold` at ratio `delta`
///
/// Returns fully-unset boundaries when the trace holds no qualifying sizes.
pub fn synthesize_groups(trace: &Trace, delta: f64, threshold: Size) -> GroupBoundaries {
    let sizes: Vec<Size> = trace.distinct_sizes_above(threshold).into_iter().collect();
    let mut groups = GroupBoundaries::unset();
    let last = match sizes.last() {
        Some(&last) => last,
        None => return groups,
    };

    let mut group_start = sizes[0];
    let mut boundary = 0;
    let mut index = 0;
    let mut prev = sizes[0];

    for &size in &sizes {
        if (size - group_start) as f64 / group_start as f64 > delta {
            boundary = prev;
            groups.set(index, boundary);
            index += 1;
            group_start = size;
            if index == GROUP_SLOTS - 1 {
                // The last slot takes whatever remains
                groups.set(index, last);
                index += 1;
                break;
            }
        }
        prev = size;
    }
    if boundary != last && index < GROUP_SLOTS {
        groups.set(index, last);
    }

    debug!("grouping delta {delta}: {} sizes -> {groups}", sizes.len());
    groups
}
