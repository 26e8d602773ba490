//! Storage Layer
//!
//! Provides blink metric persistence: an in-memory repository with retention
//! and time queries, and append-only JSON sequence files.

mod json_file;
mod repository;

pub use json_file::JsonSequenceFile;
pub use repository::{BlinkMetricRecord, Repository, DEFAULT_QUERY_WINDOW_SECS};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
