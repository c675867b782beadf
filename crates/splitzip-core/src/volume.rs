//! Volume container primitives
//!
//! Thin wrappers over the `zip` crate. A volume is an ordinary ZIP file
//! named `{base}_part{N}_of_{T}.zip`; the writer takes owned buffers so a
//! caller hands each entry's bytes over exactly once.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{Error, Result};

/// Forced extension for volume files.
pub const VOLUME_EXTENSION: &str = "zip";

/// Compose the file name of volume `part` out of `total` for `base_path`.
///
/// The base path's own extension, if any, is replaced with `.zip`.
pub fn volume_file_name(base_path: &Path, part: u32, total: u32) -> PathBuf {
    let stem = base_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let name = format!("{}_part{}_of_{}.{}", stem, part, total, VOLUME_EXTENSION);
    match base_path.parent() {
        Some(parent) if parent != Path::new("") => parent.join(name),
        _ => PathBuf::from(name),
    }
}

/// Writer for one volume file.
pub struct VolumeWriter {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
}

impl VolumeWriter {
    /// Create the volume file, truncating any existing file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|_| Error::VolumeCreate {
            path: path.to_path_buf(),
        })?;
        debug!("Creating volume {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(BufWriter::new(file)),
        })
    }

    /// Path of the volume being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add one entry. Takes the buffer by value; the bytes are written and
    /// dropped here.
    pub fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(bytes.len() as u64 >= u32::MAX as u64);

        self.writer
            .start_file(name, options)
            .map_err(|_| Error::EntryWrite {
                name: name.to_string(),
            })?;
        self.writer
            .write_all(&bytes)
            .map_err(|_| Error::EntryWrite {
                name: name.to_string(),
            })?;
        Ok(())
    }

    /// Finalize the central directory and flush the file.
    pub fn finish(self) -> Result<()> {
        let path = self.path;
        self.writer
            .finish()
            .map_err(|_| Error::VolumeClose { path: path.clone() })?
            .flush()
            .map_err(|_| Error::VolumeClose { path })?;
        Ok(())
    }
}

/// Reader for one volume file.
pub struct VolumeReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl VolumeReader {
    /// Open an existing volume for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path of the opened volume.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the volume.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the volume has no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Entry names, in central-directory order.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Whether the volume contains an entry named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Read the entry named `name` fully into memory, if present.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(index) = self.archive.index_for_name(name) else {
            return Ok(None);
        };
        let mut entry = self.archive.by_index(index)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }
}
