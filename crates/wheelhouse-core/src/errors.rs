//! Shared error types

use thiserror::Error;

/// Core errors shared between the service and clients
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid game configuration: {0}")]
    InvalidGame(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
