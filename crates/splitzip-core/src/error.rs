//! Error types for splitzip-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the splitzip library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error
    #[error("Zip error: {0}")]
    Zip(String),

    /// Invalid file or directory path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Could not create a volume file
    #[error("Failed to create volume: {path}")]
    VolumeCreate { path: PathBuf },

    /// Could not write an entry into a volume
    #[error("Failed to write entry '{name}' into volume")]
    EntryWrite { name: String },

    /// Could not finalize a volume file
    #[error("Failed to close volume: {path}")]
    VolumeClose { path: PathBuf },

    /// A source file could not be read
    #[error("Failed to read source file: {path}")]
    SourceFileUnreadable { path: PathBuf },

    /// A fragmented file is missing fragments
    #[error("Incomplete fragments for '{file}': found {found} of {total}")]
    FragmentIncomplete {
        file: String,
        found: usize,
        total: u32,
    },

    /// Supplied password does not match the archive's password hash
    #[error("Authentication failed: wrong or missing password")]
    AuthenticationFailed,

    /// A volume carries no manifest entry
    #[error("No manifest entry found in volume: {volume}")]
    ManifestMissing { volume: PathBuf },

    /// A volume's manifest entry could not be parsed
    #[error("Unparseable manifest in volume: {volume}")]
    ManifestUnparseable { volume: PathBuf },

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Some operations failed during batch processing
    #[error("Partial failure: {count} operations failed")]
    PartialFailure { count: u32 },

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
