// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the tool binary, using
//! `tokio::process::Command`, and turning what happens into a
//! [`RunOutput`] or a [`RunError`].
//!
//! - [`runner`] owns the [`Runner`]: subcommand templates and the retry loop.
//! - [`attempt`] is the per-attempt state machine (spawn, capture, race
//!   against cancellation, graceful stop, force-kill).
//! - [`capture`] holds the per-stream copy tasks and pass-through sinks.
//! - [`process`] provides the [`Launcher`] / [`Subprocess`] traits and the
//!   real `tokio::process` implementation, which tests replace with a fake.
//! - [`events`] defines what the runner reports to its [`RunObserver`].

mod attempt;
pub mod capture;
pub mod error;
pub mod events;
pub mod output;
pub mod process;
pub mod runner;

pub use capture::{OutputSink, SharedBuffer, StdStream};
pub use error::RunError;
pub use events::{RunEvent, RunObserver, TracingObserver};
pub use output::{RUNNER_EXIT_CODE, RunOutput};
pub use process::{BoxedReader, CommandLine, Launcher, Spawned, Subprocess, TokioLauncher, WaitFuture};
pub use runner::{RunResult, Runner};
