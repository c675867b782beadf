//! Common test fixtures for splitzip testing

use crate::TestDir;
use anyhow::Result;
use rand::{Rng, SeedableRng};

/// Creates a standard small source tree
pub fn create_source_tree(test_dir: &TestDir) -> Result<()> {
    // Text files
    test_dir.create_file("file1.txt", b"This is file 1 content.")?;
    test_dir.create_file("file2.txt", b"This is file 2 content.")?;

    // Directory structure
    test_dir.create_dir("subdir")?;
    test_dir.create_file("subdir/file3.txt", b"This is file 3 in subdir.")?;
    test_dir.create_file("subdir/nested/file4.txt", b"Deeply nested file.")?;

    // Binary file (simple image placeholder)
    test_dir.create_file("image.jpg", &[0xFF, 0xD8, 0xFF, 0xE0])?;

    // Empty file
    test_dir.create_file("empty.dat", b"")?;

    Ok(())
}

/// Creates a source tree containing one file larger than `limit_bytes`,
/// forcing fragmentation when packed with that limit.
pub fn create_tree_with_oversized_file(test_dir: &TestDir, limit_bytes: usize) -> Result<()> {
    create_source_tree(test_dir)?;
    test_dir.create_file("big/payload.bin", &deterministic_bytes(limit_bytes * 2 + limit_bytes / 2))?;
    Ok(())
}

/// Creates a source tree carrying an `.ignore` file and material that the
/// rules exclude.
pub fn create_tree_with_ignores(test_dir: &TestDir) -> Result<()> {
    test_dir.create_file(".ignore", b"# test rules\n/secrets\n*.tmp\nlogs\n")?;
    test_dir.create_file("keep.txt", b"kept")?;
    test_dir.create_file("secrets/key.pem", b"private")?;
    test_dir.create_file("scratch.tmp", b"scratch")?;
    test_dir.create_file("logs/run.log", b"log line")?;
    test_dir.create_file("sub/also.tmp", b"scratch")?;
    Ok(())
}

/// Seeded pseudo-random payload; identical across runs so snapshots of
/// restored trees can be compared byte for byte.
pub fn deterministic_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_CAFE);
    (0..len).map(|_| rng.gen()).collect()
}
