pub mod campaigns;
pub mod players;

pub use campaigns::*;
pub use players::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("problem querying db: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(#[from] wheelhouse_core::CoreError),
    #[error("background thread died: {0}")]
    Thread(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}
