//! Splitzip core library
//!
//! Splits a directory tree into size-bounded ZIP volumes and reassembles
//! the original tree from them. Files larger than the volume limit are cut
//! into fragments, one volume per fragment. Content can be obfuscated with
//! a password-derived XOR keystream; each volume carries a plain-text
//! manifest mapping its entries back to source paths.
//!
//! # Example
//!
//! ```no_run
//! use splitzip_core::{pack, unpack, PackOptions, UnpackOptions};
//! use std::path::Path;
//!
//! let options = PackOptions { volume_size_mb: 512, ..Default::default() };
//! let summary = pack(Path::new("photos"), Path::new("out/backup.zip"), &options)?;
//! println!("wrote {} volumes", summary.parts);
//!
//! unpack(Path::new("out"), Path::new("restored"), &UnpackOptions::default())?;
//! # Ok::<(), splitzip_core::Error>(())
//! ```

pub mod cipher;
pub mod collect;
pub mod config;
pub mod error;
pub mod ignore;
pub mod manifest;
pub mod pack;
pub mod planner;
pub mod progress;
pub mod unpack;
pub mod volume;

pub use cipher::{password_hash, KeystreamCipher};
pub use collect::{collect_files, SourceFile};
pub use config::Config;
pub use error::{Error, Result};
pub use ignore::IgnoreList;
pub use manifest::VolumeManifest;
pub use pack::{pack, pack_with_progress, PackOptions, PackSummary};
pub use planner::estimate_volume_count;
pub use progress::ProgressReporter;
pub use unpack::{unpack, unpack_with_progress, UnpackOptions, UnpackSummary};
