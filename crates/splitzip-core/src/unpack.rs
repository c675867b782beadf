//! Reconstruction pipeline
//!
//! Unpacking runs in three passes over the volume directory:
//!
//! 1. inspection: every `*.zip` directly in the directory is opened, its
//!    manifest parsed and the fragment index built; password checks happen
//!    here, before any payload byte is extracted,
//! 2. whole files: every non-fragment entry is extracted to the output tree,
//! 3. fragments: each fragmented file is reassembled from its fragments in
//!    ascending order.
//!
//! Per-file errors are recorded and reconstruction continues; only an
//! authentication failure aborts the run outright.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cipher::{password_hash, KeystreamCipher};
use crate::manifest::{fragment_entry_name, is_manifest_entry, parse_fragment_name, VolumeManifest};
use crate::pack::{effective_cipher, effective_password};
use crate::progress::ProgressReporter;
use crate::volume::VolumeReader;
use crate::{Error, Result};

/// Options for one unpack run.
#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    /// Password the volume set was packed with, if any.
    pub password: Option<String>,
}

/// Outcome of an unpack run.
#[derive(Debug, Clone, Default)]
pub struct UnpackSummary {
    /// Volumes inspected.
    pub volumes: usize,
    /// Whole files extracted.
    pub files: usize,
    /// Fragmented files reassembled.
    pub reassembled: usize,
    /// Per-item failures recorded during the run.
    pub failed: u32,
}

impl UnpackSummary {
    /// Whether every item was restored without error.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Reconstruct the tree packed into the volumes under `volume_dir`.
pub fn unpack(volume_dir: &Path, output_dir: &Path, options: &UnpackOptions) -> Result<UnpackSummary> {
    unpack_with_progress(volume_dir, output_dir, options, &mut ProgressReporter::disabled())
}

/// Unpack with progress reporting.
pub fn unpack_with_progress(
    volume_dir: &Path,
    output_dir: &Path,
    options: &UnpackOptions,
    progress: &mut ProgressReporter,
) -> Result<UnpackSummary> {
    let cipher = effective_cipher(options.password.as_deref());

    let volume_paths = scan_volumes(volume_dir)?;
    if volume_paths.is_empty() {
        return Err(Error::Other(format!(
            "no volume files found in {}",
            volume_dir.display()
        )));
    }

    let mut summary = UnpackSummary::default();
    let mut volumes: Vec<(VolumeManifest, VolumeReader)> = Vec::new();

    // Pass 1: open everything and parse manifests.
    for path in &volume_paths {
        match inspect_volume(path, cipher.as_ref()) {
            Ok(opened) => volumes.push(opened),
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                summary.failed += 1;
            }
        }
    }
    summary.volumes = volumes.len();

    authenticate(&volumes, options.password.as_deref())?;

    let index = build_fragment_index(&volumes);
    let whole_files: Vec<(usize, String)> = volumes
        .iter()
        .enumerate()
        .flat_map(|(volume_idx, (manifest, _))| {
            manifest
                .entries
                .iter()
                .filter(|e| !is_manifest_entry(&e.name) && parse_fragment_name(&e.name).is_none())
                .map(move |e| (volume_idx, e.name.clone()))
        })
        .collect();

    info!(
        "Restoring {} whole files and {} fragmented files from {} volumes",
        whole_files.len(),
        index.len(),
        volumes.len()
    );
    progress.start((whole_files.len() + index.len()) as u64, "Unpacking");

    fs::create_dir_all(output_dir)?;

    // Pass 2: whole files.
    for (volume_idx, name) in whole_files {
        let reader = &mut volumes[volume_idx].1;
        match extract_entry(reader, &name, output_dir, cipher.as_ref()) {
            Ok(()) => summary.files += 1,
            Err(e) => {
                warn!("Failed to restore {}: {}", name, e);
                summary.failed += 1;
            }
        }
        progress.tick();
    }

    // Pass 3: fragmented files.
    for (base, fragments) in &index {
        match reassemble(base, fragments, &mut volumes, output_dir, cipher.as_ref()) {
            Ok(()) => summary.reassembled += 1,
            Err(e) => {
                warn!("Failed to reassemble {}: {}", base, e);
                summary.failed += 1;
            }
        }
        progress.tick();
    }

    progress.finish("Unpacking done");
    info!(
        "Restored {} files, {} reassembled, {} failures",
        summary.files, summary.reassembled, summary.failed
    );

    Ok(summary)
}

/// Enumerate `*.zip` files directly inside `dir` (not recursive), sorted by
/// name for a stable processing order.
fn scan_volumes(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == "zip")
        })
        .collect();
    paths.sort();

    debug!("Found {} candidate volumes in {:?}", paths.len(), dir);
    Ok(paths)
}

/// Open one volume and parse its manifest.
fn inspect_volume(
    path: &Path,
    cipher: Option<&KeystreamCipher>,
) -> Result<(VolumeManifest, VolumeReader)> {
    let mut reader = VolumeReader::open(path)?;

    let manifest_name = reader
        .entry_names()
        .into_iter()
        .find(|name| is_manifest_entry(name))
        .ok_or_else(|| Error::ManifestMissing {
            volume: path.to_path_buf(),
        })?;

    let bytes = reader
        .read_entry(&manifest_name)?
        .ok_or_else(|| Error::ManifestMissing {
            volume: path.to_path_buf(),
        })?;

    let manifest =
        VolumeManifest::parse_bytes(&bytes, cipher).ok_or_else(|| Error::ManifestUnparseable {
            volume: path.to_path_buf(),
        })?;

    debug!(
        "Volume {:?}: part {} of {}, {} entries",
        path,
        manifest.part_number,
        manifest.total_parts,
        manifest.entries.len()
    );

    Ok((manifest, reader))
}

/// Check the supplied password against every declared fingerprint. Fails
/// fast: nothing has been extracted when this errors.
fn authenticate(volumes: &[(VolumeManifest, VolumeReader)], password: Option<&str>) -> Result<()> {
    let declared = volumes
        .iter()
        .find_map(|(manifest, _)| manifest.password_hash.as_deref());

    let Some(declared) = declared else {
        return Ok(());
    };

    let supplied = effective_password(password).ok_or(Error::AuthenticationFailed)?;
    if password_hash(supplied) != declared {
        return Err(Error::AuthenticationFailed);
    }
    Ok(())
}

/// Distinct fragment indices discovered for one fragmented file.
struct FragmentSet {
    /// Declared fragment count (from the fragment names).
    total: u32,
    /// Fragment index -> volume holding it. Duplicates collapse; the last
    /// discovered volume wins.
    by_index: BTreeMap<u32, usize>,
}

fn build_fragment_index(
    volumes: &[(VolumeManifest, VolumeReader)],
) -> BTreeMap<String, FragmentSet> {
    let mut index: BTreeMap<String, FragmentSet> = BTreeMap::new();

    for (volume_idx, (manifest, _)) in volumes.iter().enumerate() {
        for entry in &manifest.entries {
            let Some(fragment) = parse_fragment_name(&entry.name) else {
                continue;
            };
            let set = index.entry(fragment.base.clone()).or_insert(FragmentSet {
                total: fragment.total,
                by_index: BTreeMap::new(),
            });
            set.total = set.total.max(fragment.total);
            set.by_index.insert(fragment.index, volume_idx);
        }
    }

    index
}

/// Join an entry name under the output root, rejecting names that would
/// escape it.
fn safe_target(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    let escapes = rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(Error::InvalidPath(format!("unsafe entry name: {}", name)));
    }
    Ok(output_dir.join(rel))
}

fn extract_entry(
    reader: &mut VolumeReader,
    name: &str,
    output_dir: &Path,
    cipher: Option<&KeystreamCipher>,
) -> Result<()> {
    let target = safe_target(output_dir, name)?;

    let mut bytes = reader
        .read_entry(name)?
        .ok_or_else(|| Error::Other(format!("entry '{}' missing from volume", name)))?;
    if let Some(cipher) = cipher {
        cipher.transform(&mut bytes);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, bytes)?;
    Ok(())
}

/// Stitch one fragmented file back together. A missing fragment or a
/// mid-stream read error aborts this file only; a partial output file may
/// be left behind.
fn reassemble(
    base: &str,
    fragments: &FragmentSet,
    volumes: &mut [(VolumeManifest, VolumeReader)],
    output_dir: &Path,
    cipher: Option<&KeystreamCipher>,
) -> Result<()> {
    let found = fragments.by_index.len();
    let complete = found as u64 == u64::from(fragments.total)
        && fragments
            .by_index
            .keys()
            .zip(1..=fragments.total)
            .all(|(&have, want)| have == want);
    if !complete {
        return Err(Error::FragmentIncomplete {
            file: base.to_string(),
            found,
            total: fragments.total,
        });
    }

    let target = safe_target(output_dir, base)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut output = fs::File::create(&target)?;

    for (&index, &volume_idx) in &fragments.by_index {
        let name = fragment_entry_name(base, index, fragments.total);
        let mut bytes = find_fragment(volumes, volume_idx, &name)?;
        if let Some(cipher) = cipher {
            cipher.transform(&mut bytes);
        }
        std::io::Write::write_all(&mut output, &bytes)?;
    }

    debug!("Reassembled {} from {} fragments", base, fragments.total);
    Ok(())
}

/// Read a fragment entry, preferring the volume it was indexed in but
/// falling back to a search across all opened volumes.
fn find_fragment(
    volumes: &mut [(VolumeManifest, VolumeReader)],
    preferred: usize,
    name: &str,
) -> Result<Vec<u8>> {
    if let Some(bytes) = volumes[preferred].1.read_entry(name)? {
        return Ok(bytes);
    }
    for (_, reader) in volumes.iter_mut() {
        if let Some(bytes) = reader.read_entry(name)? {
            return Ok(bytes);
        }
    }
    Err(Error::Other(format!(
        "fragment entry '{}' not found in any volume",
        name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_with(entries: &[&str]) -> VolumeManifest {
        let mut manifest = VolumeManifest::new(1, 1, None);
        for name in entries {
            manifest.push_entry(*name, format!("/src/{}", name));
        }
        manifest
    }

    #[test]
    fn test_fragment_index_collapses_duplicates() {
        // Two volumes both carrying fragment 1; the index keeps one.
        let temp = tempfile::TempDir::new().unwrap();
        let mut volumes = Vec::new();
        for part in 1..=2u32 {
            let path = temp.path().join(format!("v{}.zip", part));
            let mut writer = crate::volume::VolumeWriter::create(&path).unwrap();
            writer.add_entry("pad", vec![0]).unwrap();
            writer.finish().unwrap();
            let reader = VolumeReader::open(&path).unwrap();
            volumes.push((manifest_with(&["big.bin.fragment1_of_2"]), reader));
        }
        volumes[1].0 = manifest_with(&["big.bin.fragment1_of_2", "big.bin.fragment2_of_2"]);

        let index = build_fragment_index(&volumes);
        let set = index.get("big.bin").unwrap();
        assert_eq!(set.total, 2);
        assert_eq!(set.by_index.len(), 2);
    }

    #[test]
    fn test_safe_target_rejects_escapes() {
        let out = Path::new("/restore");
        assert!(safe_target(out, "sub/file.txt").is_ok());
        assert!(safe_target(out, "../outside.txt").is_err());
        assert!(safe_target(out, "sub/../../outside.txt").is_err());
        assert!(safe_target(out, "/etc/passwd").is_err());
    }

    #[test]
    fn test_scan_volumes_is_not_recursive() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("a.zip"), "x").unwrap();
        fs::write(temp.path().join("b.txt"), "x").unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/c.zip"), "x").unwrap();

        let found = scan_volumes(temp.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.zip"));
    }
}
