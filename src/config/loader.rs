// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, RunnerConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
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
/// - Reads TOML.
/// - Checks durations, the working directory and retry patterns.
/// - Resolves a relative `working_dir` and relative `var_files` against the
///   directory holding the config file, so the tool can be driven from
///   anywhere.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunnerConfig> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let mut config = RunnerConfig::try_from(raw_config)?;

    let root = config_root_dir(path);
    let opts = &mut config.options;
    if opts.working_dir.is_relative() {
        opts.working_dir = root.join(&opts.working_dir);
    }
    for file in opts.var_files.iter_mut() {
        if file.is_relative() {
            *file = opts.working_dir.join(&*file);
        }
    }

    Ok(config)
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Tfrunner.toml")
}

/// - If the config path has a non-empty parent (e.g. "ci/Tfrunner.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Tfrunner.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
