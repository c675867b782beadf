//! Configuration file handling
//!
//! Persistent defaults live in a TOML file at
//! `{config_dir}/splitzip/config.toml`. CLI flags always win over the file.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Default volume size limit in megabytes.
pub const DEFAULT_VOLUME_SIZE_MB: u64 = 1024;

/// Persistent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Defaults applied to `pack` runs.
    pub pack: PackDefaults,
    /// Worker thread count; `None` lets rayon size the pool.
    pub threads: Option<usize>,
}

/// Pack-specific defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackDefaults {
    /// Volume size limit in megabytes.
    pub volume_size_mb: u64,
    /// Whether to pack in parallel by default.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pack: PackDefaults::default(),
            threads: None,
        }
    }
}

impl Default for PackDefaults {
    fn default() -> Self {
        Self {
            volume_size_mb: DEFAULT_VOLUME_SIZE_MB,
            parallel: true,
        }
    }
}

impl Config {
    /// Path of the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Ok(base.join("splitzip").join("config.toml"))
    }

    /// Load the configuration file.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {:?}: {}", path, e)))?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Load the configuration file, falling back to defaults when it does
    /// not exist or cannot be parsed.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Write the configuration file, creating parent directories.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }
}
