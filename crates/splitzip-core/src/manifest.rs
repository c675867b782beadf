//! Per-volume manifest protocol
//!
//! Every volume carries exactly one plain-text manifest entry named
//! `part_{N}.info`:
//!
//! ```text
//! <totalParts>
//! <thisPartNumber>
//! [encrypted: <passwordHashHex>]
//! <entryName> | <originalAbsolutePath>
//! ...
//! ```
//!
//! Fragment entries use the qualified name `{base}.fragment{k}_of_{F}`
//! (k is 1-based). Manifests are written plaintext; a decoder attempts the
//! plaintext grammar first and only applies the keystream cipher when the
//! first two lines do not parse as integers.

use crate::cipher::KeystreamCipher;

/// Marker prefix for the optional encryption line.
const ENCRYPTED_PREFIX: &str = "encrypted: ";

/// One `entryName | originalPath` mapping line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Entry name inside the volume (fragment-qualified for fragments).
    pub name: String,
    /// Absolute path of the source file the entry came from.
    pub original_path: String,
}

/// Parsed manifest of a single volume.
#[derive(Debug, Clone, Default)]
pub struct VolumeManifest {
    /// Total number of volumes in the set, as known when this volume was
    /// written (may be lower than the final count for early volumes).
    pub total_parts: u32,
    /// 1-based index of this volume.
    pub part_number: u32,
    /// Password fingerprint when the set was written with a password.
    pub password_hash: Option<String>,
    /// Entry-to-original-path mappings, fragments included.
    pub entries: Vec<ManifestEntry>,
}

impl VolumeManifest {
    pub fn new(total_parts: u32, part_number: u32, password_hash: Option<String>) -> Self {
        Self {
            total_parts,
            part_number,
            password_hash,
            entries: Vec::new(),
        }
    }

    /// Name of the manifest entry inside this volume.
    pub fn entry_name(&self) -> String {
        manifest_entry_name(self.part_number)
    }

    /// Record a mapping line.
    pub fn push_entry(&mut self, name: impl Into<String>, original_path: impl Into<String>) {
        self.entries.push(ManifestEntry {
            name: name.into(),
            original_path: original_path.into(),
        });
    }

    /// Render the on-disk text form.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n", self.total_parts, self.part_number);
        if let Some(hash) = &self.password_hash {
            out.push_str(ENCRYPTED_PREFIX);
            out.push_str(hash);
            out.push('\n');
        }
        for entry in &self.entries {
            out.push_str(&entry.name);
            out.push_str(" | ");
            out.push_str(&entry.original_path);
            out.push('\n');
        }
        out
    }

    /// Parse the plaintext grammar. Returns `None` when the first two lines
    /// are not integers (the caller may then try the cipher fallback).
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = lines_of(text);

        let total_parts: u32 = lines.next()?.trim().parse().ok()?;
        let part_number: u32 = lines.next()?.trim().parse().ok()?;

        let mut manifest = Self::new(total_parts, part_number, None);

        for line in lines {
            if line.is_empty() {
                continue;
            }
            if let Some(hash) = line.strip_prefix(ENCRYPTED_PREFIX) {
                manifest.password_hash = Some(hash.trim().to_string());
                continue;
            }
            if let Some((name, original)) = line.split_once(" | ") {
                manifest.push_entry(name, original);
            }
        }

        Some(manifest)
    }

    /// Parse manifest bytes, trying plaintext first and falling back to the
    /// cipher when a password is available.
    pub fn parse_bytes(bytes: &[u8], cipher: Option<&KeystreamCipher>) -> Option<Self> {
        if let Some(manifest) = std::str::from_utf8(bytes).ok().and_then(Self::parse) {
            return Some(manifest);
        }
        let cipher = cipher?;
        let decrypted = cipher.transform_vec(bytes.to_vec());
        std::str::from_utf8(&decrypted).ok().and_then(Self::parse)
    }
}

fn lines_of(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end)
}

/// Manifest entry name for volume `part`.
pub fn manifest_entry_name(part: u32) -> String {
    format!("part_{}.info", part)
}

/// Whether `name` is a manifest entry (any part number).
pub fn is_manifest_entry(name: &str) -> bool {
    name.strip_prefix("part_")
        .and_then(|rest| rest.strip_suffix(".info"))
        .is_some_and(|num| !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()))
}

/// Fragment-qualified entry name for fragment `index` (1-based) of `total`.
pub fn fragment_entry_name(base: &str, index: u32, total: u32) -> String {
    format!("{}.fragment{}_of_{}", base, index, total)
}

/// Parsed components of a fragment-qualified entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentName {
    /// Relative path of the original file.
    pub base: String,
    /// 1-based fragment index.
    pub index: u32,
    /// Total fragment count for the file.
    pub total: u32,
}

/// Parse `{base}.fragment{k}_of_{F}`. Returns `None` for non-fragment names.
pub fn parse_fragment_name(name: &str) -> Option<FragmentName> {
    let (base, suffix) = name.rsplit_once(".fragment")?;
    if base.is_empty() {
        return None;
    }
    let (index_str, total_str) = suffix.split_once("_of_")?;
    let index: u32 = index_str.parse().ok()?;
    let total: u32 = total_str.parse().ok()?;
    if index == 0 || total == 0 {
        return None;
    }
    Some(FragmentName {
        base: base.to_string(),
        index,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::password_hash;

    #[test]
    fn test_render_parse_round_trip() {
        let mut manifest = VolumeManifest::new(4, 2, Some(password_hash("pw")));
        manifest.push_entry("docs/readme.md", "/src/docs/readme.md");
        manifest.push_entry("data.bin.fragment1_of_3", "/src/data.bin");

        let text = manifest.render();
        let parsed = VolumeManifest::parse(&text).unwrap();

        assert_eq!(parsed.total_parts, 4);
        assert_eq!(parsed.part_number, 2);
        assert_eq!(parsed.password_hash, manifest.password_hash);
        assert_eq!(parsed.entries, manifest.entries);
    }

    #[test]
    fn test_parse_without_encryption_marker() {
        let parsed = VolumeManifest::parse("3\n1\na.txt | /root/a.txt\n").unwrap();
        assert_eq!(parsed.total_parts, 3);
        assert_eq!(parsed.part_number, 1);
        assert!(parsed.password_hash.is_none());
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn test_parse_rejects_non_integer_header() {
        assert!(VolumeManifest::parse("not a number\n1\n").is_none());
        assert!(VolumeManifest::parse("").is_none());
    }

    #[test]
    fn test_parse_bytes_cipher_fallback() {
        let manifest_text = "2\n1\nfile.txt | /root/file.txt\n";
        let cipher = KeystreamCipher::new("pw");
        let encrypted = cipher.transform_vec(manifest_text.as_bytes().to_vec());

        // Without the cipher the bytes do not parse.
        assert!(VolumeManifest::parse_bytes(&encrypted, None).is_none());

        let parsed = VolumeManifest::parse_bytes(&encrypted, Some(&cipher)).unwrap();
        assert_eq!(parsed.total_parts, 2);
        assert_eq!(parsed.entries[0].name, "file.txt");
    }

    #[test]
    fn test_manifest_entry_name_detection() {
        assert!(is_manifest_entry("part_1.info"));
        assert!(is_manifest_entry("part_42.info"));
        assert!(!is_manifest_entry("part_.info"));
        assert!(!is_manifest_entry("part_x.info"));
        assert!(!is_manifest_entry("notes.info.txt"));
    }

    #[test]
    fn test_fragment_name_round_trip() {
        let name = fragment_entry_name("media/video.mkv", 2, 5);
        assert_eq!(name, "media/video.mkv.fragment2_of_5");

        let parsed = parse_fragment_name(&name).unwrap();
        assert_eq!(parsed.base, "media/video.mkv");
        assert_eq!(parsed.index, 2);
        assert_eq!(parsed.total, 5);
    }

    #[test]
    fn test_fragment_name_rejects_malformed() {
        assert!(parse_fragment_name("plain.txt").is_none());
        assert!(parse_fragment_name("a.fragmentX_of_2").is_none());
        assert!(parse_fragment_name("a.fragment1_of_").is_none());
        assert!(parse_fragment_name("a.fragment0_of_2").is_none());
    }
}
