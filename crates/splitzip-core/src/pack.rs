//! Packing pipeline
//!
//! Splits a source tree into size-bounded volumes. Files at or under the
//! limit are grouped greedily in collection order; a file over the limit is
//! cut into `ceil(size / limit)` fragments, one volume per fragment, written
//! by independent rayon tasks. Shared state across fragment tasks is limited
//! to atomic counters, so serial (one-thread pool) and parallel runs produce
//! logically identical volume sets.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::cipher::{password_hash, KeystreamCipher};
use crate::collect::{collect_files, SourceFile};
use crate::ignore::IgnoreList;
use crate::manifest::{fragment_entry_name, VolumeManifest};
use crate::planner::{estimate_volume_count, fragments_needed};
use crate::progress::ProgressReporter;
use crate::volume::{volume_file_name, VolumeWriter};
use crate::{Error, Result};

/// Options for one pack run. Everything is explicit; there is no ambient
/// cipher or thread-count state.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Volume size limit in megabytes.
    pub volume_size_mb: u64,
    /// Obfuscation password. `None` (or empty) writes content verbatim.
    pub password: Option<String>,
    /// Whether to use a multi-threaded pool.
    pub parallel: bool,
    /// Worker count for the parallel pool; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            volume_size_mb: crate::config::DEFAULT_VOLUME_SIZE_MB,
            password: None,
            parallel: true,
            threads: None,
        }
    }
}

/// Outcome of a pack run.
#[derive(Debug, Clone, Default)]
pub struct PackSummary {
    /// Volumes actually written.
    pub parts: u32,
    /// Fragment volumes among them.
    pub fragments: u32,
    /// Source files processed successfully.
    pub files: usize,
    /// Total payload bytes read from the source tree.
    pub total_bytes: u64,
    /// Per-item failures recorded during the run.
    pub failed: u32,
    /// Paths of the volumes this run claimed, in part order.
    pub volumes: Vec<PathBuf>,
}

impl PackSummary {
    /// Whether every item was packed without error.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Pack `source_dir` into volumes named after `output_path`.
pub fn pack(source_dir: &Path, output_path: &Path, options: &PackOptions) -> Result<PackSummary> {
    pack_with_progress(source_dir, output_path, options, &mut ProgressReporter::disabled())
}

/// Pack with progress reporting.
pub fn pack_with_progress(
    source_dir: &Path,
    output_path: &Path,
    options: &PackOptions,
    progress: &mut ProgressReporter,
) -> Result<PackSummary> {
    if options.volume_size_mb == 0 {
        return Err(Error::Config("volume size must be positive".to_string()));
    }
    let limit = options.volume_size_mb * 1024 * 1024;

    let threads = if options.parallel {
        options.threads.unwrap_or(0)
    } else {
        1
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Other(format!("could not build thread pool: {}", e)))?;

    pool.install(|| run_pack(source_dir, output_path, limit, options, progress))
}

fn run_pack(
    source_dir: &Path,
    output_path: &Path,
    limit: u64,
    options: &PackOptions,
    progress: &mut ProgressReporter,
) -> Result<PackSummary> {
    let ignore = IgnoreList::load(source_dir);
    let files = collect_files(source_dir, &ignore)?;

    let mut total_parts = estimate_volume_count(&files, limit);
    info!(
        "Packing {} files into an estimated {} volumes (limit {} bytes)",
        files.len(),
        total_parts,
        limit
    );

    let cipher = effective_cipher(options.password.as_deref());
    let hash = effective_password(options.password.as_deref()).map(password_hash);

    progress.start(files.len() as u64, "Packing");

    let mut summary = PackSummary::default();
    let mut part: u32 = 1;
    let mut current: Option<OpenVolume> = None;

    for file in &files {
        if file.size > limit {
            // Fragmented files never share a volume with anything else.
            if let Some(open) = current.take() {
                summary.failed += open.close();
                part += 1;
            }

            let count = fragments_needed(file.size, limit);
            if count > total_parts {
                total_parts = count;
            }

            let failed = pack_fragments(
                file,
                part,
                count,
                total_parts,
                limit,
                output_path,
                cipher.as_ref(),
                hash.as_deref(),
            );
            summary.failed += failed;
            if failed == 0 {
                summary.files += 1;
                summary.total_bytes += file.size;
            }

            // Fragment volumes are claimed even when some of them failed.
            for k in 0..count {
                summary
                    .volumes
                    .push(volume_file_name(output_path, part + k, total_parts));
            }
            part += count;
            summary.fragments += count;
            summary.parts += count;
            progress.tick();
            continue;
        }

        // A full volume rolls over before the next file is admitted. The
        // first file of a volume is always admitted without a size check.
        if current
            .as_ref()
            .is_some_and(|open| open.used > 0 && open.used + file.size > limit)
        {
            let open = current.take().expect("volume state checked above");
            summary.failed += open.close();
            part += 1;
        }

        if current.is_none() {
            match OpenVolume::create(output_path, part, total_parts, hash.clone()) {
                Ok(open) => {
                    summary.parts += 1;
                    summary.volumes.push(open.writer.path().to_path_buf());
                    current = Some(open);
                }
                Err(e) => {
                    warn!("Skipping volume {}: {}", part, e);
                    summary.failed += 1;
                    part += 1;
                    progress.tick();
                    continue;
                }
            }
        }
        let open = current.as_mut().expect("volume opened above");

        match open.add_file(file, cipher.as_ref()) {
            Ok(()) => {
                summary.files += 1;
                summary.total_bytes += file.size;
            }
            Err(e) => {
                warn!("Failed to pack {:?}: {}", file.path, e);
                summary.failed += 1;
            }
        }
        progress.tick();
    }

    if let Some(open) = current.take() {
        summary.failed += open.close();
    }

    progress.finish("Packing done");
    info!(
        "Wrote {} volumes ({} fragment volumes), {} files, {} bytes, {} failures",
        summary.parts, summary.fragments, summary.files, summary.total_bytes, summary.failed
    );

    Ok(summary)
}

/// One volume being filled with whole files.
struct OpenVolume {
    writer: VolumeWriter,
    manifest: VolumeManifest,
    used: u64,
}

impl OpenVolume {
    fn create(
        output_path: &Path,
        part: u32,
        total_parts: u32,
        password_hash: Option<String>,
    ) -> Result<Self> {
        let path = volume_file_name(output_path, part, total_parts);
        let writer = VolumeWriter::create(&path)?;
        Ok(Self {
            writer,
            manifest: VolumeManifest::new(total_parts, part, password_hash),
            used: 0,
        })
    }

    fn add_file(&mut self, file: &SourceFile, cipher: Option<&KeystreamCipher>) -> Result<()> {
        let mut bytes = std::fs::read(&file.path).map_err(|_| Error::SourceFileUnreadable {
            path: file.path.clone(),
        })?;
        if let Some(cipher) = cipher {
            cipher.transform(&mut bytes);
        }
        self.writer.add_entry(&file.relative, bytes)?;
        self.manifest
            .push_entry(&file.relative, file.path.display().to_string());
        self.used += file.size;
        Ok(())
    }

    /// Write the manifest entry and finalize the volume. Returns the number
    /// of failures recorded (0 or 1); the manifest write is attempted even
    /// for a volume that saw entry failures.
    fn close(mut self) -> u32 {
        let name = self.manifest.entry_name();
        let rendered = self.manifest.render().into_bytes();
        if let Err(e) = self.writer.add_entry(&name, rendered) {
            warn!("Failed to write manifest into {:?}: {}", self.writer.path(), e);
            return 1;
        }
        if let Err(e) = self.writer.finish() {
            warn!("Failed to close volume: {}", e);
            return 1;
        }
        0
    }
}

/// Write all fragments of one oversized file, one task per fragment.
/// Returns the number of failed fragments.
#[allow(clippy::too_many_arguments)]
fn pack_fragments(
    file: &SourceFile,
    part_start: u32,
    count: u32,
    total_parts: u32,
    limit: u64,
    output_path: &Path,
    cipher: Option<&KeystreamCipher>,
    password_hash: Option<&str>,
) -> u32 {
    let failed = AtomicU32::new(0);

    (0..count).into_par_iter().for_each(|k| {
        let part = part_start + k;
        let path = volume_file_name(output_path, part, total_parts);
        match write_fragment(file, k, count, part, total_parts, limit, &path, cipher, password_hash)
        {
            Ok(()) => {}
            Err(e) => {
                warn!(
                    "Failed to write fragment {} of {} for {:?}: {}",
                    k + 1,
                    count,
                    file.path,
                    e
                );
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    failed.load(Ordering::Relaxed)
}

#[allow(clippy::too_many_arguments)]
fn write_fragment(
    file: &SourceFile,
    k: u32,
    count: u32,
    part: u32,
    total_parts: u32,
    limit: u64,
    volume_path: &Path,
    cipher: Option<&KeystreamCipher>,
    password_hash: Option<&str>,
) -> Result<()> {
    let offset = u64::from(k) * limit;
    let len = limit.min(file.size - offset) as usize;

    // Each task holds its own handle; no read position is shared.
    let mut handle = File::open(&file.path).map_err(|_| Error::SourceFileUnreadable {
        path: file.path.clone(),
    })?;
    handle.seek(SeekFrom::Start(offset))?;
    let mut bytes = vec![0u8; len];
    handle.read_exact(&mut bytes)?;

    if let Some(cipher) = cipher {
        cipher.transform(&mut bytes);
    }

    let entry_name = fragment_entry_name(&file.relative, k + 1, count);
    let mut writer = VolumeWriter::create(volume_path)?;
    writer.add_entry(&entry_name, bytes)?;

    let mut manifest = VolumeManifest::new(total_parts, part, password_hash.map(str::to_string));
    manifest.push_entry(&entry_name, file.path.display().to_string());
    writer.add_entry(&manifest.entry_name(), manifest.render().into_bytes())?;
    writer.finish()?;
    Ok(())
}

/// Cipher for a run, or `None` when the password is absent or empty.
pub(crate) fn effective_cipher(password: Option<&str>) -> Option<KeystreamCipher> {
    effective_password(password).map(KeystreamCipher::new)
}

pub(crate) fn effective_password(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}
