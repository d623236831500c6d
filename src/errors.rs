use std::io;

use thiserror::Error;

/// Error type for suite construction, validation, and persistence failures.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}
