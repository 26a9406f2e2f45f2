/*!
 * Configuration Types
 */

use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration operation result
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("min_large_alloc {min_large_alloc} must be strictly below large_buffer {large_buffer}")]
    MinLargeAllocTooLarge {
        min_large_alloc: Size,
        large_buffer: Size,
    },

    #[error("knob {knob} value {value} is outside its candidate set")]
    OutsideCandidateSet { knob: &'static str, value: Size },
}
