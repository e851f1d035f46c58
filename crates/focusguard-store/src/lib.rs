//! Persistence layer for focusguard
//!
//! Provides:
//! - The block list store trait
//! - A JSON file implementation (`{"blocked_apps": [...]}`)
//! - An in-memory implementation for tests

mod json;
mod traits;

pub use json::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
