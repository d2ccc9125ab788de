// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Config, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point when the caller knows the file
/// exists:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks the command line, threshold, and env table for obvious mistakes.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw = load_from_path(&path)?;
    Config::try_from(raw)
}

/// Load configuration, tolerating a missing file at the *default* path.
///
/// A missing `Cronwrap.toml` means "use built-in defaults". A path the user
/// picked explicitly must exist.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<Config> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        return Config::try_from(RawConfigFile::default());
    }
    load_and_validate(path)
}

/// Helper to resolve the default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Cronwrap.toml")
}
