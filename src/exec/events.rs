// src/exec/events.rs

//! Progress reporting for runner calls.
//!
//! The runner never logs through ambient global state on its own: it emits
//! [`RunEvent`]s to the [`RunObserver`] it was constructed with. The default
//! [`TracingObserver`] forwards them to `tracing`; tests plug in a recorder.
//! Observers are told what happened and have no say in what happens next.

use std::time::Duration;

use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    AttemptStarted {
        attempt: u32,
        max_attempts: u32,
        command: String,
    },
    AttemptSucceeded {
        attempt: u32,
    },
    AttemptFailed {
        attempt: u32,
        exit_code: i32,
        error: String,
    },
    /// A failure matched a retry pattern; the next attempt follows `delay`.
    RetryScheduled {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        delay: Duration,
    },
    /// Cancellation arrived during the back-off; no further attempt is made.
    BackoffInterrupted {
        attempt: u32,
    },
    GracefulStopRequested,
    GracefulStopFailed {
        error: String,
    },
    ExitedAfterStopRequest {
        exit_code: i32,
    },
    ForceKilled {
        timeout: Duration,
    },
}

pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

impl<F> RunObserver for F
where
    F: Fn(&RunEvent) + Send + Sync,
{
    fn on_event(&self, event: &RunEvent) {
        self(event)
    }
}

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::AttemptStarted {
                attempt,
                max_attempts,
                command,
            } => info!(attempt, max_attempts, cmd = %command, "running"),
            RunEvent::AttemptSucceeded { attempt } => debug!(attempt, "attempt succeeded"),
            RunEvent::AttemptFailed {
                attempt,
                exit_code,
                error,
            } => warn!(attempt, exit_code, error = %error, "attempt failed"),
            RunEvent::RetryScheduled {
                attempt,
                max_attempts,
                reason,
                delay,
            } => info!(
                attempt,
                max_attempts,
                reason = %reason,
                delay_ms = delay.as_millis() as u64,
                "retryable error detected"
            ),
            RunEvent::BackoffInterrupted { attempt } => {
                info!(attempt, "cancelled while waiting to retry")
            }
            RunEvent::GracefulStopRequested => {
                info!("cancellation requested; sending interrupt for graceful shutdown")
            }
            RunEvent::GracefulStopFailed { error } => {
                warn!(error = %error, "failed to send interrupt")
            }
            RunEvent::ExitedAfterStopRequest { exit_code } => {
                info!(exit_code, "process exited gracefully after interrupt")
            }
            RunEvent::ForceKilled { timeout } => warn!(
                timeout_ms = timeout.as_millis() as u64,
                "graceful shutdown timeout exceeded; killing process"
            ),
        }
    }
}
