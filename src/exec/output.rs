// src/exec/output.rs

/// Exit code the runner reports when no real exit code exists: the process
/// could not be spawned, never ran, or was force-killed.
pub const RUNNER_EXIT_CODE: i32 = -1;

/// Captured outcome of one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Output for an attempt that never produced a process.
    pub fn not_started() -> Self {
        Self::new("", "", RUNNER_EXIT_CODE)
    }

    /// Stdout and stderr joined by a newline, trimmed.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr).trim().to_string()
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
