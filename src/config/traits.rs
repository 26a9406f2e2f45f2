/*!
 * Configuration Store
 * Capability seam for persisting and recalling a tuned configuration
 */

use super::groups::GroupBoundaries;
use crate::core::types::Size;
use thiserror::Error;

/// Persistence result
pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence errors; the controller keeps its prior mode when these surface
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("config store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config store parse failed at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// A persisted best configuration
///
/// The callpath hashes belong to the static-tensor identification feature
/// layered above this crate; they are carried opaquely so a file written by
/// that layer round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestConfig {
    /// The six knobs in persistence order
    pub knobs: [Size; 6],
    /// Group boundaries, present when group optimization produced them
    pub groups: Option<GroupBoundaries>,
    /// Opaque trailing callpath-hash lines
    pub callpath_hashes: Vec<String>,
}

/// Read/write access to the persisted best configuration
pub trait ConfigStore {
    /// Persist a best configuration
    fn save(&self, best: &BestConfig) -> PersistResult<()>;

    /// Recall the persisted configuration; `expect_groups` selects the
    /// file variant that carries the five boundary lines
    fn load(&self, expect_groups: bool) -> PersistResult<BestConfig>;
}
