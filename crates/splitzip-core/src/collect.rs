//! Source tree collection
//!
//! Discovery walks the tree sequentially; ignore filtering fans out over a
//! rayon pool. Each worker filters a disjoint chunk of the discovered list
//! into a private buffer, and buffers are merged under a single lock region
//! per worker. Chunks are reassembled in chunk order so the resulting file
//! order is identical for serial and parallel runs; the packer relies on
//! that order to place volume boundaries.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::ignore::IgnoreList;
use crate::{Error, Result};

/// One regular file discovered under the source root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the source root, forward-slash separated.
    pub relative: String,
    /// File size in bytes at discovery time.
    pub size: u64,
}

/// Compute the forward-slash relative path of `path` under `root`.
pub(crate) fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| Error::InvalidPath(format!("{} is not under the source root", path.display())))?;
    Ok(rel.to_string_lossy().replace('\\', "/"))
}

/// Enumerate the non-ignored regular files under `root`, in stable order.
pub fn collect_files<P: AsRef<Path>>(root: P, ignore: &IgnoreList) -> Result<Vec<SourceFile>> {
    let root = root.as_ref();

    if !root.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    // Sequential, name-sorted discovery keeps traversal order stable
    // across runs and platforms; volume boundaries depend on it.
    let mut discovered = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            discovered.push(entry.into_path());
        }
    }

    debug!("Discovered {} regular files under {:?}", discovered.len(), root);

    // Filter in parallel: one private buffer per chunk, one merge per chunk.
    let chunk_size = chunk_size_for(discovered.len());
    let merged: Mutex<Vec<(usize, Vec<SourceFile>)>> = Mutex::new(Vec::new());

    let filter_result: Result<()> = discovered
        .par_chunks(chunk_size)
        .enumerate()
        .try_for_each(|(chunk_idx, chunk)| {
            let mut local = Vec::with_capacity(chunk.len());
            for path in chunk {
                let relative = relative_name(root, path)?;
                if ignore.matches(&relative) {
                    continue;
                }
                let size = path
                    .metadata()
                    .map_err(|_| Error::SourceFileUnreadable { path: path.clone() })?
                    .len();
                local.push(SourceFile {
                    path: path.clone(),
                    relative,
                    size,
                });
            }
            let mut guard = merged.lock().expect("collector merge lock poisoned");
            guard.push((chunk_idx, local));
            Ok(())
        });
    filter_result?;

    // Reassemble in chunk order: serial and parallel runs see the same list.
    let mut buffers = merged.into_inner().expect("collector merge lock poisoned");
    buffers.sort_by_key(|(idx, _)| *idx);

    let files: Vec<SourceFile> = buffers.into_iter().flat_map(|(_, b)| b).collect();

    info!(
        "Collected {} files to archive ({} ignored)",
        files.len(),
        discovered.len() - files.len()
    );

    Ok(files)
}

fn chunk_size_for(total: usize) -> usize {
    let workers = rayon::current_num_threads().max(1);
    (total / workers).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_skips_ignored_and_ignore_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".ignore"), "logs\n").unwrap();
        fs::create_dir_all(temp.path().join("logs")).unwrap();
        fs::write(temp.path().join("logs/a.log"), "x").unwrap();
        fs::write(temp.path().join("keep.txt"), "y").unwrap();

        let ignore = IgnoreList::load(temp.path());
        let files = collect_files(temp.path(), &ignore).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "keep.txt");
        assert_eq!(files[0].size, 1);
    }

    #[test]
    fn test_collect_order_is_stable() {
        let temp = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(temp.path().join(format!("f{:02}.dat", i)), "data").unwrap();
        }

        let ignore = IgnoreList::default();
        let first = collect_files(temp.path(), &ignore).unwrap();
        let second = collect_files(temp.path(), &ignore).unwrap();

        let names = |v: &[SourceFile]| v.iter().map(|f| f.relative.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_collect_rejects_non_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let result = collect_files(&file, &IgnoreList::default());
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }
}
