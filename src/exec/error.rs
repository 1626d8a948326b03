// src/exec/error.rs

use std::time::Duration;

use thiserror::Error;

use super::RunOutput;

/// Why a call to the runner failed.
///
/// Every variant carries the output captured up to the failure; nothing
/// already read from the process is discarded.
#[derive(Error, Debug)]
pub enum RunError {
    /// The process could not be started.
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
        output: RunOutput,
    },

    /// The process ran and exited non-zero.
    #[error("{binary} exited with code {}", .output.exit_code)]
    Tool { binary: String, output: RunOutput },

    /// The OS could not report the process's exit status.
    #[error("waiting for {binary}: {source}")]
    Wait {
        binary: String,
        #[source]
        source: std::io::Error,
        output: RunOutput,
    },

    /// The caller cancelled. If a process was running it was interrupted and
    /// exited on its own; `output` holds what it actually reported.
    #[error("{binary} cancelled (exit code {})", .output.exit_code)]
    Cancelled { binary: String, output: RunOutput },

    /// The interrupted process outlived the graceful-shutdown budget and was
    /// killed.
    #[error("{binary} killed after exceeding graceful-shutdown budget of {timeout:?}")]
    ForceKilled {
        binary: String,
        timeout: Duration,
        output: RunOutput,
    },
}

impl RunError {
    /// Output captured before the failure.
    pub fn output(&self) -> &RunOutput {
        match self {
            RunError::Spawn { output, .. }
            | RunError::Tool { output, .. }
            | RunError::Wait { output, .. }
            | RunError::Cancelled { output, .. }
            | RunError::ForceKilled { output, .. } => output,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.output().exit_code
    }

    /// Whether the retry patterns may be consulted for this failure.
    ///
    /// Cancellation and force-kills always end the call.
    pub fn is_retry_eligible(&self) -> bool {
        matches!(
            self,
            RunError::Spawn { .. } | RunError::Tool { .. } | RunError::Wait { .. }
        )
    }
}
