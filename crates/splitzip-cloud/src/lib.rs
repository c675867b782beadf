//! # splitzip-cloud
//!
//! Upload boundary for splitzip volume sets. The packer hands a finished
//! list of volume paths to an [`Uploader`]; each file either yields a share
//! link or an error, and one failed transfer never stops the rest of the
//! batch.
//!
//! The crate ships a single reference backend, [`LocalDirUploader`], which
//! copies volumes into a target directory and returns `file://` links. It
//! exists so the contract can be exercised without network credentials;
//! real storage backends implement [`Uploader`] out of tree.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;

pub use error::{CloudError, Result};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// A destination that volume files can be pushed to.
pub trait Uploader {
    /// Upload one file, returning a link to the stored copy.
    fn upload(&self, file: &Path) -> Result<String>;
}

/// Outcome of uploading one file.
#[derive(Debug)]
pub struct UploadReport {
    /// The local file that was uploaded.
    pub path: PathBuf,
    /// Share link on success, error on failure.
    pub outcome: Result<String>,
}

/// Upload every file in `files`, continuing past individual failures.
pub fn upload_files(uploader: &dyn Uploader, files: &[PathBuf]) -> Vec<UploadReport> {
    files
        .iter()
        .map(|path| {
            let outcome = uploader.upload(path);
            match &outcome {
                Ok(link) => info!("Uploaded {:?} -> {}", path, link),
                Err(e) => warn!("Upload of {:?} failed: {}", path, e),
            }
            UploadReport {
                path: path.clone(),
                outcome,
            }
        })
        .collect()
}

/// Reference backend that copies files into a local directory.
#[derive(Debug, Clone)]
pub struct LocalDirUploader {
    target: PathBuf,
}

impl LocalDirUploader {
    /// Create an uploader targeting `target`, creating it if needed.
    pub fn new(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        fs::create_dir_all(&target)?;
        Ok(Self { target })
    }

    /// The directory uploads are copied into.
    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Uploader for LocalDirUploader {
    fn upload(&self, file: &Path) -> Result<String> {
        let name = file.file_name().ok_or_else(|| CloudError::Unreadable {
            path: file.to_path_buf(),
        })?;
        if !file.is_file() {
            return Err(CloudError::Unreadable {
                path: file.to_path_buf(),
            });
        }

        let destination = self.target.join(name);
        fs::copy(file, &destination)
            .map_err(|e| CloudError::Transfer(format!("copy to {:?}: {}", destination, e)))?;

        Ok(format!("file://{}", destination.display()))
    }
}
