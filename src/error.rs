//! Error types for the request store

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the request store and its file backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// No stored request has this (method, url) identity
    #[error("'{method} {url}' value does not exist")]
    NotFound { method: String, url: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode the document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
