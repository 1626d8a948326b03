// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Failures of an individual tool invocation live in [`crate::exec::RunError`];
//! this enum covers everything that goes wrong before a process is ever
//! launched (config files, retry patterns, variable files).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfrunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid retry pattern '{pattern}': {source}")]
    InvalidRetryPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TfrunnerError>;
