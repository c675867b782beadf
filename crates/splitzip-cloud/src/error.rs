//! Error types for splitzip-cloud

use std::path::PathBuf;
use thiserror::Error;

/// Errors an uploader can report for a single file.
#[derive(Error, Debug)]
pub enum CloudError {
    /// The file to upload could not be read
    #[error("Cannot read file for upload: {path}")]
    Unreadable {
        /// Path that failed to open
        path: PathBuf,
    },

    /// The backend rejected or failed the transfer
    #[error("Upload failed: {0}")]
    Transfer(String),

    /// I/O failure while talking to the backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for cloud operations
pub type Result<T> = std::result::Result<T, CloudError>;
