// src/exec/attempt.rs

//! One spawn-to-exit cycle of the tool.
//!
//! ```text
//! STARTING ──► RUNNING ──► COMPLETED
//!                 │
//!                 └─(cancel)─► CANCELLING ──► GRACEFULLY_EXITED
//!                                   │
//!                                   └─(grace timer)─► FORCE_KILLED
//! ```
//!
//! Exactly two races are awaited: process exit against cancellation, and,
//! only once cancelled, process exit against the grace timer.
//!
//! Draining the output pipes after exit is bounded the same way. A
//! grandchild may inherit the pipes and hold them open long after the tool
//! exits; once the call is cancelled it gets the grace budget to close them,
//! then the capture is abandoned.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;

use super::capture::{Capture, OutputSink};
use super::error::RunError;
use super::events::{RunEvent, RunObserver};
use super::output::{RUNNER_EXIT_CODE, RunOutput};
use super::process::{CommandLine, Launcher, Spawned};

pub(crate) struct Attempt<'a> {
    pub launcher: &'a dyn Launcher,
    pub observer: &'a dyn RunObserver,
    pub command: &'a CommandLine,
    pub binary: &'a str,
    pub stdout_sink: Option<Arc<dyn OutputSink>>,
    pub stderr_sink: Option<Arc<dyn OutputSink>>,
    pub graceful_shutdown_timeout: Duration,
}

impl Attempt<'_> {
    pub(crate) async fn run(self, cancel: &CancellationToken) -> Result<RunOutput, RunError> {
        // STARTING
        let Spawned {
            mut process,
            stdout,
            stderr,
        } = match self.launcher.launch(self.command) {
            Ok(spawned) => spawned,
            Err(source) => {
                return Err(RunError::Spawn {
                    binary: self.binary.to_string(),
                    source,
                    output: RunOutput::not_started(),
                });
            }
        };

        // RUNNING
        let mut stdout = Capture::start("stdout", stdout, self.stdout_sink.clone());
        let mut stderr = Capture::start("stderr", stderr, self.stderr_sink.clone());

        let exited = tokio::select! {
            biased;
            status = process.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        if let Some(status) = exited {
            // COMPLETED
            let cancelled_while_draining = {
                let closed = async { tokio::join!(stdout.closed(), stderr.closed()) };
                tokio::select! {
                    biased;
                    _ = closed => false,
                    _ = cancel.cancelled() => true,
                }
            };
            if cancelled_while_draining {
                let deadline = Instant::now() + self.graceful_shutdown_timeout;
                drain_until(&mut stdout, &mut stderr, deadline).await;
            }
            return self.finish(status, stdout.into_text(), stderr.into_text(), false);
        }

        // CANCELLING
        self.observer.on_event(&RunEvent::GracefulStopRequested);
        if let Err(e) = process.request_graceful_stop() {
            self.observer.on_event(&RunEvent::GracefulStopFailed {
                error: e.to_string(),
            });
        }

        let deadline = Instant::now() + self.graceful_shutdown_timeout;
        let exited = tokio::select! {
            biased;
            status = process.wait() => Some(status),
            _ = sleep(self.graceful_shutdown_timeout) => None,
        };

        if let Some(status) = exited {
            // GRACEFULLY_EXITED
            drain_until(&mut stdout, &mut stderr, deadline).await;
            if let Ok(code) = status {
                self.observer
                    .on_event(&RunEvent::ExitedAfterStopRequest { exit_code: code });
            }
            return self.finish(status, stdout.into_text(), stderr.into_text(), true);
        }

        // FORCE_KILLED
        self.observer.on_event(&RunEvent::ForceKilled {
            timeout: self.graceful_shutdown_timeout,
        });
        if let Err(e) = process.force_stop() {
            tracing::debug!(error = %e, "kill failed; process may already be gone");
        }
        if let Err(e) = process.wait().await {
            tracing::debug!(error = %e, "reaping killed process failed");
        }

        Err(RunError::ForceKilled {
            binary: self.binary.to_string(),
            timeout: self.graceful_shutdown_timeout,
            output: RunOutput::new(stdout.into_text(), stderr.into_text(), RUNNER_EXIT_CODE),
        })
    }

    fn finish(
        &self,
        status: io::Result<i32>,
        stdout: String,
        stderr: String,
        cancelled: bool,
    ) -> Result<RunOutput, RunError> {
        let binary = self.binary.to_string();

        let code = match status {
            Ok(code) => code,
            Err(source) => {
                return Err(RunError::Wait {
                    binary,
                    source,
                    output: RunOutput::new(stdout, stderr, RUNNER_EXIT_CODE),
                });
            }
        };

        let output = RunOutput::new(stdout, stderr, code);
        if code == 0 {
            Ok(output)
        } else if cancelled {
            Err(RunError::Cancelled { binary, output })
        } else {
            Err(RunError::Tool { binary, output })
        }
    }
}

/// Wait for both streams to close, giving up at `deadline`.
async fn drain_until(stdout: &mut Capture, stderr: &mut Capture, deadline: Instant) {
    let closed = async { tokio::join!(stdout.closed(), stderr.closed()) };
    if timeout_at(deadline, closed).await.is_err() {
        tracing::debug!("output pipes still open at drain deadline");
    }
}
