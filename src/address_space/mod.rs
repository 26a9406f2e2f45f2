/*!
 * Address Space
 *
 * Flat synthetic free-list over integer addresses, standing in for the
 * device driver's virtual address allocator.
 *
 * ## Behavior
 *
 * - **First-fit allocate**: scan free ranges in address order, take the
 *   first one large enough, reinsert the unused suffix
 * - **Coalescing free**: returned ranges merge with touching neighbours
 * - **Determinism**: the address sequence returned for a given request
 *   sequence is a pure function of the starting free set
 *
 * No actual memory is touched; addresses are plain integers.
 */

mod types;

pub use types::{AddressRange, AllocError, AllocResult};

use crate::core::limits::SEGMENT_BASE_ADDRESS;
use crate::core::types::{Address, Size};
use log::trace;
use std::collections::BTreeMap;

/// Synthetic device address space
///
/// Free and allocated ranges are kept as `start -> end` maps so neighbour
/// lookups on free are two `BTreeMap` range probes.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    /// Free ranges, keyed by start address
    free: BTreeMap<Address, Address>,
    /// Allocated ranges, keyed by start address
    allocated: BTreeMap<Address, Address>,
    base: Address,
    end: Address,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::with_base(SEGMENT_BASE_ADDRESS)
    }

    /// Create an address space whose single free range starts at `base`
    pub fn with_base(base: Address) -> Self {
        Self::bounded(base, Address::MAX)
    }

    /// Create an address space holding exactly `capacity` bytes, modelling
    /// a device with finite memory
    pub fn with_capacity(capacity: Size) -> Self {
        Self::bounded(SEGMENT_BASE_ADDRESS, SEGMENT_BASE_ADDRESS + capacity)
    }

    fn bounded(base: Address, end: Address) -> Self {
        let mut free = BTreeMap::new();
        free.insert(base, end);
        Self {
            free,
            allocated: BTreeMap::new(),
            base,
            end,
        }
    }

    /// Reserve `size` bytes, first-fit in address order
    pub fn allocate(&mut self, size: Size) -> AllocResult<Address> {
        let found = self
            .free
            .iter()
            .find(|(&start, &end)| end - start >= size)
            .map(|(&start, &end)| (start, end));

        let (start, end) = found.ok_or(AllocError::AddressSpaceExhausted { requested: size })?;

        self.free.remove(&start);
        if end - start > size {
            self.free.insert(start + size, end);
        }
        self.allocated.insert(start, start + size);

        trace!("address space: reserved [{start:#x}, {:#x})", start + size);
        Ok(start)
    }

    /// Return a previously reserved range, coalescing with free neighbours
    pub fn free(&mut self, addr: Address, size: Size) {
        let removed = self.allocated.remove(&addr);
        debug_assert!(
            removed == Some(addr + size),
            "freeing an address range that was never reserved"
        );

        let mut start = addr;
        let mut end = addr + size;

        // Left neighbour whose end touches this range
        if let Some((&left_start, &left_end)) = self.free.range(..addr).next_back() {
            if left_end == start {
                self.free.remove(&left_start);
                start = left_start;
            }
        }
        // Right neighbour whose start touches this range
        if let Some((&right_start, &right_end)) = self.free.range(addr..).next() {
            if right_start == end {
                self.free.remove(&right_start);
                end = right_end;
            }
        }

        self.free.insert(start, end);
        trace!("address space: released [{addr:#x}, {:#x})", addr + size);
    }

    /// Drop all reservations and restore the pristine free set
    pub fn reset(&mut self) {
        self.free.clear();
        self.free.insert(self.base, self.end);
        self.allocated.clear();
    }

    /// Number of live reservations
    pub fn allocated_ranges(&self) -> usize {
        self.allocated.len()
    }

    /// Total bytes currently reserved
    pub fn allocated_bytes(&self) -> Size {
        self.allocated.iter().map(|(&s, &e)| e - s).sum()
    }

    /// Free ranges as `[start, end)` pairs, in address order
    pub fn free_ranges(&self) -> Vec<AddressRange> {
        self.free
            .iter()
            .map(|(&start, &end)| AddressRange { start, end })
            .collect()
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
