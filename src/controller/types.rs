/*!
 * Controller Types
 */

use crate::address_space::AllocError;
use crate::config::{ConfigError, PersistError};
use crate::replay::{ReplayError, TraceError};
use thiserror::Error;

/// Controller operation result
pub type ControlResult<T> = Result<T, ControlError>;

/// Anything the controller surface can fail with
#[derive(Error, Debug)]
pub enum ControlError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Alloc(#[from] AllocError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}
