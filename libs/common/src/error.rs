//! Custom error types for the record store adapter
//!
//! Every failure talking to the remote store collapses into
//! [`StoreError::Unavailable`]; callers do not retry and do not distinguish
//! transport failures from bad responses.

use thiserror::Error;

/// Custom error type for record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The remote store could not be queried or returned an unusable response
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// Configuration error
    #[error("Record store configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("undecodable response: {}", err))
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
