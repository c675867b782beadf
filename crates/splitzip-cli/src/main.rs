//! splitzip - split a directory tree into size-bounded ZIP volumes
//!
//! This crate provides the CLI for splitzip, including:
//! - Packing a directory into a sequence of volumes with a size limit
//! - Reassembling the original tree from a volume directory
//! - Password-based content obfuscation
//! - A benchmark mode comparing serial and parallel packing

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use splitzip_core::{Config, PackOptions, ProgressReporter, UnpackOptions};

/// splitzip - split a directory tree into size-bounded ZIP volumes
///
/// Splitzip packs a directory into numbered ZIP volumes that each stay under
/// a size limit, fragments files larger than the limit across volumes, and
/// restores the original tree from the volume set.
#[derive(Parser)]
#[command(name = "splitzip")]
#[command(author, version, about = "Split a directory tree into size-bounded ZIP volumes", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show progress bar during operations
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into size-bounded volumes
    Pack {
        /// Source directory to pack
        source: PathBuf,

        /// Base path for volume files (volumes become {base}_partN_of_T.zip)
        #[arg(short, long)]
        output: PathBuf,

        /// Volume size limit in megabytes
        #[arg(long)]
        size_mb: Option<u64>,

        /// Obfuscate content with this password
        #[arg(short, long)]
        password: Option<String>,

        /// Force parallel packing
        #[arg(long)]
        parallel: bool,

        /// Force single-threaded packing
        #[arg(long, conflicts_with = "parallel")]
        serial: bool,

        /// Number of worker threads
        #[arg(long)]
        threads: Option<usize>,

        /// Copy finished volumes into this directory after packing
        #[cfg(feature = "cloud")]
        #[arg(long)]
        upload: Option<PathBuf>,
    },

    /// Reassemble a tree from a directory of volumes
    Unpack {
        /// Directory containing the volume files
        volumes: PathBuf,

        /// Output directory for the restored tree
        #[arg(short, long)]
        output: PathBuf,

        /// Password the volumes were packed with
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Benchmark serial vs parallel packing of a directory
    Bench {
        /// Source directory to pack
        source: PathBuf,

        /// Volume size limit in megabytes
        #[arg(long)]
        size_mb: Option<u64>,

        /// Obfuscate content with this password
        #[arg(short, long)]
        password: Option<String>,

        /// Number of worker threads for the parallel run
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Show or locate the configuration file
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with = "path")]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with = "show")]
        path: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let show_progress = cli.progress && !cli.quiet;

    match cli.command {
        Commands::Pack {
            source,
            output,
            size_mb,
            password,
            parallel,
            serial,
            threads,
            #[cfg(feature = "cloud")]
            upload,
        } => {
            let config = Config::load_or_default();
            let options = PackOptions {
                volume_size_mb: size_mb.unwrap_or(config.pack.volume_size_mb),
                password,
                parallel: if serial {
                    false
                } else {
                    parallel || config.pack.parallel
                },
                threads: threads.or(config.threads),
            };

            info!("Packing {:?} into volumes at {:?}", source, output);
            let mut progress = ProgressReporter::new(show_progress);
            let summary =
                splitzip_core::pack_with_progress(&source, &output, &options, &mut progress)?;

            println!(
                "Packed {} files ({} bytes) into {} volumes ({} fragment volumes)",
                summary.files, summary.total_bytes, summary.parts, summary.fragments
            );

            #[cfg(feature = "cloud")]
            if let Some(target) = upload {
                upload_volumes(&summary.volumes, &target)?;
            }

            if !summary.success() {
                return Err(splitzip_core::Error::PartialFailure {
                    count: summary.failed,
                }
                .into());
            }
        }

        Commands::Unpack {
            volumes,
            output,
            password,
        } => {
            info!("Unpacking volumes from {:?} into {:?}", volumes, output);
            let options = UnpackOptions { password };
            let mut progress = ProgressReporter::new(show_progress);
            let summary =
                splitzip_core::unpack_with_progress(&volumes, &output, &options, &mut progress)?;

            println!(
                "Restored {} files ({} reassembled from fragments) from {} volumes",
                summary.files, summary.reassembled, summary.volumes
            );

            if !summary.success() {
                return Err(splitzip_core::Error::PartialFailure {
                    count: summary.failed,
                }
                .into());
            }
        }

        Commands::Bench {
            source,
            size_mb,
            password,
            threads,
        } => {
            run_bench(&source, size_mb, password, threads)?;
        }

        Commands::Config { show, path } => {
            if show {
                let config = Config::load_or_default();
                let toml_str = toml::to_string_pretty(&config)?;
                println!("{}", toml_str);
            } else if path {
                let config_path = Config::config_path()
                    .map_err(|e| anyhow::anyhow!("Failed to get config path: {}", e))?;
                println!("{}", config_path.display());
            } else {
                eprintln!("Please specify --show or --path");
            }
        }
    }

    Ok(())
}

/// Pack the source twice, single-threaded then with the full pool, and
/// print a timing comparison. Volumes land in throwaway directories.
fn run_bench(
    source: &PathBuf,
    size_mb: Option<u64>,
    password: Option<String>,
    threads: Option<usize>,
) -> Result<()> {
    let config = Config::load_or_default();
    let base = PackOptions {
        volume_size_mb: size_mb.unwrap_or(config.pack.volume_size_mb),
        password,
        parallel: false,
        threads: None,
    };

    let serial_dir = tempfile::tempdir()?;
    info!("Benchmark: serial pass");
    let start = Instant::now();
    let serial = splitzip_core::pack(source, &serial_dir.path().join("bench.zip"), &base)?;
    let serial_elapsed = start.elapsed();

    let parallel_dir = tempfile::tempdir()?;
    let parallel_options = PackOptions {
        parallel: true,
        threads: threads.or(config.threads),
        ..base
    };
    info!("Benchmark: parallel pass");
    let start = Instant::now();
    let parallel = splitzip_core::pack(
        source,
        &parallel_dir.path().join("bench.zip"),
        &parallel_options,
    )?;
    let parallel_elapsed = start.elapsed();

    let workers = parallel_options
        .threads
        .unwrap_or_else(num_default_threads);
    let serial_secs = serial_elapsed.as_secs_f64().max(f64::EPSILON);
    let parallel_secs = parallel_elapsed.as_secs_f64().max(f64::EPSILON);
    let speedup = serial_secs / parallel_secs;

    println!("Benchmark results ({} files, {} volumes):", serial.files, serial.parts);
    println!(
        "  serial:   {:>8.3} s  ({:.1} files/s)",
        serial_secs,
        serial.files as f64 / serial_secs
    );
    println!(
        "  parallel: {:>8.3} s  ({:.1} files/s, {} workers)",
        parallel_secs,
        parallel.files as f64 / parallel_secs,
        workers
    );
    println!(
        "  speedup:  {:>8.2}x  (efficiency {:.0}%)",
        speedup,
        speedup / workers as f64 * 100.0
    );

    Ok(())
}

fn num_default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Copy finished volumes to the upload target, reporting per-file results.
#[cfg(feature = "cloud")]
fn upload_volumes(volumes: &[PathBuf], target: &PathBuf) -> Result<()> {
    use splitzip_cloud::{upload_files, LocalDirUploader};

    let uploader = LocalDirUploader::new(target.clone())
        .map_err(|e| anyhow::anyhow!("Cannot prepare upload target: {}", e))?;
    let reports = upload_files(&uploader, volumes);

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    println!("Uploaded {}/{} volumes to {:?}", reports.len() - failed, reports.len(), target);

    if failed > 0 {
        return Err(splitzip_core::Error::PartialFailure {
            count: failed as u32,
        }
        .into());
    }
    Ok(())
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: IO error
/// - 3: Invalid arguments or configuration
/// - 4: Partial failure
/// - 5: Authentication failure
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<splitzip_core::Error>() {
        match core_err {
            splitzip_core::Error::Io(_) => 2,
            splitzip_core::Error::SourceFileUnreadable { .. } => 2,
            splitzip_core::Error::InvalidPath(_) => 3,
            splitzip_core::Error::Config(_) => 3,
            splitzip_core::Error::AuthenticationFailed => 5,
            splitzip_core::Error::Zip(_) => 4,
            splitzip_core::Error::VolumeCreate { .. } => 4,
            splitzip_core::Error::EntryWrite { .. } => 4,
            splitzip_core::Error::VolumeClose { .. } => 4,
            splitzip_core::Error::FragmentIncomplete { .. } => 4,
            splitzip_core::Error::ManifestMissing { .. } => 4,
            splitzip_core::Error::ManifestUnparseable { .. } => 4,
            splitzip_core::Error::PartialFailure { .. } => 4,
            splitzip_core::Error::Other(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}
