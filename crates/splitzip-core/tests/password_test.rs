//! Password obfuscation and authentication behavior

use splitzip_core::{pack, unpack, Error, PackOptions, UnpackOptions};
use splitzip_testing::{fixtures, snapshot_tree, TestDir};

fn pack_options(password: &str) -> PackOptions {
    PackOptions {
        volume_size_mb: 1,
        password: Some(password.to_string()),
        parallel: false,
        threads: None,
    }
}

fn unpack_options(password: Option<&str>) -> UnpackOptions {
    UnpackOptions {
        password: password.map(str::to_string),
    }
}

#[test]
fn test_round_trip_with_password() {
    let source = TestDir::new().unwrap();
    fixtures::create_tree_with_oversized_file(&source, 1024 * 1024).unwrap();
    let volumes = TestDir::new().unwrap();
    let restored = TestDir::new().unwrap();

    let summary = pack(
        source.path(),
        &volumes.path().join("backup.zip"),
        &pack_options("hunter2"),
    )
    .unwrap();
    assert!(summary.success());

    let unpacked = unpack(
        volumes.path(),
        restored.path(),
        &unpack_options(Some("hunter2")),
    )
    .unwrap();
    assert!(unpacked.success());

    assert_eq!(
        snapshot_tree(source.path()).unwrap(),
        snapshot_tree(restored.path()).unwrap()
    );
}

#[test]
fn test_wrong_password_extracts_nothing() {
    let source = TestDir::new().unwrap();
    fixtures::create_source_tree(&source).unwrap();
    let volumes = TestDir::new().unwrap();
    let restored = TestDir::new().unwrap();

    pack(
        source.path(),
        &volumes.path().join("backup.zip"),
        &pack_options("correct"),
    )
    .unwrap();

    let result = unpack(
        volumes.path(),
        restored.path(),
        &unpack_options(Some("incorrect")),
    );
    assert!(matches!(result, Err(Error::AuthenticationFailed)));

    // Fail-fast: nothing was written before the check.
    assert!(snapshot_tree(restored.path()).unwrap().is_empty());
}

#[test]
fn test_missing_password_is_rejected() {
    let source = TestDir::new().unwrap();
    fixtures::create_source_tree(&source).unwrap();
    let volumes = TestDir::new().unwrap();
    let restored = TestDir::new().unwrap();

    pack(
        source.path(),
        &volumes.path().join("backup.zip"),
        &pack_options("secret"),
    )
    .unwrap();

    let result = unpack(volumes.path(), restored.path(), &unpack_options(None));
    assert!(matches!(result, Err(Error::AuthenticationFailed)));
}

#[test]
fn test_obfuscated_payload_differs_on_disk() {
    let source = TestDir::new().unwrap();
    // Stored-size comparison needs incompressible content.
    let payload = fixtures::deterministic_bytes(64 * 1024);
    source.create_file("data.bin", &payload).unwrap();

    let plain_out = TestDir::new().unwrap();
    let cipher_out = TestDir::new().unwrap();

    pack(
        source.path(),
        &plain_out.path().join("b.zip"),
        &PackOptions {
            volume_size_mb: 1,
            password: None,
            parallel: false,
            threads: None,
        },
    )
    .unwrap();
    pack(
        source.path(),
        &cipher_out.path().join("b.zip"),
        &pack_options("pw"),
    )
    .unwrap();

    let plain = std::fs::read(plain_out.path().join("b_part1_of_1.zip")).unwrap();
    let ciphered = std::fs::read(cipher_out.path().join("b_part1_of_1.zip")).unwrap();
    assert_ne!(plain, ciphered);
}
