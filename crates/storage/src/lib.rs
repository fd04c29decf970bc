//! Storage Layer
//!
//! Persists session summaries as one JSON file per save.

mod session_store;

pub use session_store::{SessionStore, FILE_PREFIX};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("Session file not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
