//! Packing performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use splitzip_core::{pack, PackOptions};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

/// Generate test data with specified characteristics
fn generate_test_data(dir: &TempDir, file_count: usize, file_size: usize, compressible: bool) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for i in 0..file_count {
        let file_path = dir.path().join(format!("file_{}.dat", i));
        let mut file = File::create(file_path).unwrap();

        if compressible {
            let pattern = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
            let repetitions = file_size / pattern.len();
            for _ in 0..repetitions {
                file.write_all(pattern).unwrap();
            }
        } else {
            let mut data = vec![0u8; file_size];
            rng.fill(&mut data[..]);
            file.write_all(&data).unwrap();
        }
    }
}

fn options(parallel: bool) -> PackOptions {
    PackOptions {
        volume_size_mb: 1,
        password: None,
        parallel,
        threads: None,
    }
}

/// Serial vs parallel packing of many small files
fn bench_small_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("small_files");
    group.sample_size(10);

    for (name, parallel) in [("serial", false), ("parallel", true)] {
        group.bench_with_input(
            BenchmarkId::new("pack_500_small_files", name),
            &parallel,
            |b, &parallel| {
                b.iter_with_setup(
                    || {
                        let input = TempDir::new().unwrap();
                        generate_test_data(&input, 500, 2048, true);
                        (input, TempDir::new().unwrap())
                    },
                    |(input, output)| {
                        pack(
                            black_box(input.path()),
                            black_box(&output.path().join("bench.zip")),
                            &options(parallel),
                        )
                        .unwrap();
                    },
                );
            },
        );
    }

    group.finish();
}

/// Serial vs parallel fragmentation of one oversized file
fn bench_fragmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmentation");
    group.sample_size(10);

    for (name, parallel) in [("serial", false), ("parallel", true)] {
        group.bench_with_input(
            BenchmarkId::new("pack_8mb_file", name),
            &parallel,
            |b, &parallel| {
                b.iter_with_setup(
                    || {
                        let input = TempDir::new().unwrap();
                        generate_test_data(&input, 1, 8 * 1024 * 1024, false);
                        (input, TempDir::new().unwrap())
                    },
                    |(input, output)| {
                        pack(
                            black_box(input.path()),
                            black_box(&output.path().join("bench.zip")),
                            &options(parallel),
                        )
                        .unwrap();
                    },
                );
            },
        );
    }

    group.finish();
}

/// Packing with the keystream cipher enabled
fn bench_cipher_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher");
    group.sample_size(10);

    group.bench_function("pack_4mb_with_password", |b| {
        b.iter_with_setup(
            || {
                let input = TempDir::new().unwrap();
                generate_test_data(&input, 4, 1024 * 1024, false);
                (input, TempDir::new().unwrap())
            },
            |(input, output)| {
                let opts = PackOptions {
                    password: Some("benchmark".to_string()),
                    ..options(true)
                };
                pack(
                    black_box(input.path()),
                    black_box(&output.path().join("bench.zip")),
                    &opts,
                )
                .unwrap();
            },
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_small_files,
    bench_fragmentation,
    bench_cipher_overhead
);
criterion_main!(benches);
