// src/config/model.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::OutputSink;
use crate::vars::Value;

pub const DEFAULT_BINARY: &str = "terraform";
pub const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_TIME_BETWEEN_RETRIES: Duration = Duration::from_secs(10);

/// Everything a [`crate::exec::Runner`] needs to drive the tool.
///
/// Zero-valued fields are filled in by [`Options::with_defaults`], which the
/// runner applies on construction.
#[derive(Clone, Default)]
pub struct Options {
    /// Directory the tool runs in (holds the `.tf` configuration).
    pub working_dir: PathBuf,

    /// Path or name of the tool binary. Empty means [`DEFAULT_BINARY`].
    pub binary: PathBuf,

    /// Variables passed as `-var name=literal` on apply/destroy.
    pub variables: HashMap<String, Value>,

    /// Files passed as `-var-file=<path>` on apply/destroy.
    pub var_files: Vec<PathBuf>,

    /// Overlaid on the inherited environment; these win on collision.
    pub env: HashMap<String, String>,

    /// Regex pattern -> description of failures worth retrying.
    pub retry_patterns: HashMap<String, String>,

    /// Attempts per call are `max_retries + 1`.
    pub max_retries: u32,

    pub time_between_retries: Duration,

    /// How long a process gets to exit after the interrupt before it is killed.
    pub graceful_shutdown_timeout: Duration,

    /// Append `-no-color` to init/apply/destroy.
    pub disable_color: bool,

    /// Live copy of the tool's stdout, in addition to the captured buffer.
    pub stdout: Option<Arc<dyn OutputSink>>,

    /// Live copy of the tool's stderr, in addition to the captured buffer.
    pub stderr: Option<Arc<dyn OutputSink>>,
}

impl Options {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    /// Return a copy with defaults applied to unset fields.
    pub fn with_defaults(&self) -> Self {
        let mut opts = self.clone();
        if opts.binary.as_os_str().is_empty() {
            opts.binary = PathBuf::from(DEFAULT_BINARY);
        }
        if opts.graceful_shutdown_timeout.is_zero() {
            opts.graceful_shutdown_timeout = DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT;
        }
        if opts.time_between_retries.is_zero() {
            opts.time_between_retries = DEFAULT_TIME_BETWEEN_RETRIES;
        }
        opts
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("working_dir", &self.working_dir)
            .field("binary", &self.binary)
            .field("variables", &self.variables.len())
            .field("var_files", &self.var_files)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("retry_patterns", &self.retry_patterns)
            .field("max_retries", &self.max_retries)
            .field("time_between_retries", &self.time_between_retries)
            .field("graceful_shutdown_timeout", &self.graceful_shutdown_timeout)
            .field("disable_color", &self.disable_color)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

/// Validated config file: runner options plus CLI-level orchestration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub options: Options,

    /// Workspace selected (or created) before apply/destroy.
    pub workspace: Option<String>,

    /// Pass `[vars]` through a scoped `.tfvars` file instead of `-var` flags.
    pub materialize_vars: bool,
}

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// working_dir = "installations/e2e"
/// max_retries = 3
/// time_between_retries = "10s"
///
/// [env]
/// TF_IN_AUTOMATION = "1"
///
/// [retry]
/// "connection reset by peer" = "connection reset"
///
/// [vars]
/// region = "eu-north1"
/// ```
///
/// Only `[runner].working_dir` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Pattern -> description.
    #[serde(default)]
    pub retry: BTreeMap<String, String>,

    #[serde(default)]
    pub vars: toml::Table,
}

/// `[runner]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub binary: Option<PathBuf>,

    #[serde(default)]
    pub max_retries: u32,

    /// Duration string such as `"10s"` or `"500ms"`.
    #[serde(default)]
    pub time_between_retries: Option<String>,

    /// Duration string; must be non-zero when given.
    #[serde(default)]
    pub graceful_shutdown_timeout: Option<String>,

    #[serde(default)]
    pub disable_color: bool,

    #[serde(default)]
    pub var_files: Vec<PathBuf>,

    #[serde(default)]
    pub workspace: Option<String>,

    #[serde(default)]
    pub materialize_vars: bool,
}
