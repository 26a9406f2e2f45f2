/*!
 * Group Boundaries
 * Adaptive quantisation tiers for large allocations
 */

use crate::core::limits::{GROUP_SLOTS, GROUP_UNSET};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ascending group boundaries; unset slots hold the max sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBoundaries {
    slots: [Size; GROUP_SLOTS],
}

impl GroupBoundaries {
    /// All slots unset: grouping falls through to quantum rounding
    pub fn unset() -> Self {
        Self {
            slots: [GROUP_UNSET; GROUP_SLOTS],
        }
    }

    pub fn from_slots(slots: [Size; GROUP_SLOTS]) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Size; GROUP_SLOTS] {
        &self.slots
    }

    pub fn set(&mut self, index: usize, boundary: Size) {
        self.slots[index] = boundary;
    }

    /// First boundary strictly greater than `size`, skipping nothing: the
    /// slots ascend, so the scan stops at the first hit. A sentinel hit
    /// means every concrete boundary is too small.
    pub fn boundary_above(&self, size: Size) -> Option<Size> {
        self.slots
            .iter()
            .copied()
            .find(|&boundary| size < boundary)
            .filter(|&boundary| boundary != GROUP_UNSET)
    }

    /// Whether no boundary has been synthesised
    pub fn is_unset(&self) -> bool {
        self.slots.iter().all(|&b| b == GROUP_UNSET)
    }

    /// Concrete (non-sentinel) boundaries, in order
    pub fn concrete(&self) -> impl Iterator<Item = Size> + '_ {
        self.slots.iter().copied().filter(|&b| b != GROUP_UNSET)
    }
}

impl Default for GroupBoundaries {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Display for GroupBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        write!(f, "[")?;
        for &slot in &self.slots {
            if !first {
                write!(f, ", ")?;
            }
            if slot == GROUP_UNSET {
                write!(f, "max")?;
            } else {
                write!(f, "{slot}")?;
            }
            first = false;
        }
        write!(f, "]")
    }
}
