/*!
 * Address Space Types
 */

use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address space operation result
pub type AllocResult<T> = Result<T, AllocError>;

/// Address space errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocError {
    #[error("Address space exhausted: no free range fits {requested} bytes")]
    AddressSpaceExhausted { requested: Size },
}

/// Half-open address range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AddressRange {
    pub start: Address,
    pub end: Address,
}

impl AddressRange {
    pub fn new(start: Address, end: Address) -> Self {
        Self { start, end }
    }

    /// Range length in bytes
    pub fn len(&self) -> Size {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether `addr` falls inside the range
    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr < self.end
    }
}
