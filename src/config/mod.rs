// src/config/mod.rs

//! Runner configuration.
//!
//! - [`model`] holds [`Options`] (what the runner consumes) and the TOML file
//!   model.
//! - [`validate`] turns a [`RawConfigFile`] into a [`RunnerConfig`].
//! - [`loader`] reads config files from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    DEFAULT_BINARY, DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT, DEFAULT_TIME_BETWEEN_RETRIES, Options,
    RawConfigFile, RunnerConfig, RunnerSection,
};
pub use validate::parse_duration;
