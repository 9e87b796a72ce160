//! Registry error types.

use pumpwatch_core::{Address, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] CoreError),

    #[error("Address already watched: {0}")]
    AlreadyExists(Address),

    #[error("Address not watched: {0}")]
    NotFound(Address),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
