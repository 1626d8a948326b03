// src/exec/runner.rs

//! The runner: retry loop and fixed subcommand templates on top of
//! [`Attempt`].

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::attempt::Attempt;
use super::error::RunError;
use super::events::{RunEvent, RunObserver, TracingObserver};
use super::output::RunOutput;
use super::process::{CommandLine, Launcher, TokioLauncher};
use crate::config::Options;
use crate::errors;
use crate::retry::RetryMatcher;
use crate::vars::format_var_args;

pub type RunResult = Result<RunOutput, RunError>;

/// Drives the tool binary for one working directory.
///
/// Holds no state between calls, so one runner can serve init, then apply,
/// then destroy. Calls against the same working directory must not overlap;
/// the runner does no locking of its own.
pub struct Runner {
    options: Options,
    matcher: RetryMatcher,
    launcher: Arc<dyn Launcher>,
    observer: Arc<dyn RunObserver>,
}

impl Runner {
    /// Apply defaults and compile retry patterns.
    ///
    /// A malformed pattern is returned as
    /// [`errors::TfrunnerError::InvalidRetryPattern`].
    pub fn new(options: &Options) -> errors::Result<Self> {
        let options = options.with_defaults();
        let matcher = RetryMatcher::new(&options.retry_patterns)?;

        Ok(Self {
            options,
            matcher,
            launcher: Arc::new(TokioLauncher),
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Options after defaults were applied.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn init(&self, cancel: &CancellationToken) -> RunResult {
        self.run(cancel, self.init_args()).await
    }

    pub async fn apply(&self, cancel: &CancellationToken) -> RunResult {
        self.run(cancel, self.apply_args()).await
    }

    pub async fn destroy(&self, cancel: &CancellationToken) -> RunResult {
        self.run(cancel, self.destroy_args()).await
    }

    /// Select `name`, creating it only if selection fails.
    ///
    /// Selecting first is free when the workspace exists, which is the
    /// common case, and avoids listing workspaces and parsing the output.
    pub async fn workspace_select_or_new(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RunResult {
        match self.run(cancel, ["workspace", "select", name]).await {
            Ok(output) => Ok(output),
            Err(e) if cancel.is_cancelled() || !e.is_retry_eligible() => Err(e),
            Err(e) => {
                tracing::debug!(workspace = name, error = %e, "workspace select failed; creating it");
                self.run(cancel, ["workspace", "new", name]).await
            }
        }
    }

    /// `state list`: one resource address per line of stdout.
    pub async fn state_list(&self, cancel: &CancellationToken) -> Result<Vec<String>, RunError> {
        let output = self.run(cancel, ["state", "list"]).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn state_rm(&self, cancel: &CancellationToken, address: &str) -> RunResult {
        self.run(cancel, ["state", "rm", address]).await
    }

    pub fn init_args(&self) -> Vec<String> {
        let mut args = vec!["init".to_string(), "-input=false".to_string()];
        if self.options.disable_color {
            args.push("-no-color".to_string());
        }
        args
    }

    pub fn apply_args(&self) -> Vec<String> {
        self.mutating_args("apply")
    }

    pub fn destroy_args(&self) -> Vec<String> {
        self.mutating_args("destroy")
    }

    fn mutating_args(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec![
            subcommand.to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
        ];
        if self.options.disable_color {
            args.push("-no-color".to_string());
        }
        for file in &self.options.var_files {
            args.push(format!("-var-file={}", file.display()));
        }
        args.extend(format_var_args(&self.options.variables));
        args
    }

    /// Run an arbitrary subcommand under the retry policy.
    ///
    /// Attempts are strictly sequential. A failed attempt is retried only if
    /// attempts remain, the call is not cancelled, and its output matches a
    /// retry pattern. The back-off between attempts ends early on
    /// cancellation, returning the last failure.
    pub async fn run<I, S>(&self, cancel: &CancellationToken, args: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = self.command_line(args.into_iter().map(Into::into).collect());
        let binary = self.options.binary.display().to_string();

        if cancel.is_cancelled() {
            return Err(RunError::Cancelled {
                binary,
                output: RunOutput::not_started(),
            });
        }

        let max_attempts = self.options.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            self.observer.on_event(&RunEvent::AttemptStarted {
                attempt,
                max_attempts,
                command: command.display(),
            });

            let result = Attempt {
                launcher: self.launcher.as_ref(),
                observer: self.observer.as_ref(),
                command: &command,
                binary: &binary,
                stdout_sink: self.options.stdout.clone(),
                stderr_sink: self.options.stderr.clone(),
                graceful_shutdown_timeout: self.options.graceful_shutdown_timeout,
            }
            .run(cancel)
            .await;

            let err = match result {
                Ok(output) => {
                    self.observer.on_event(&RunEvent::AttemptSucceeded { attempt });
                    return Ok(output);
                }
                Err(err) => err,
            };

            self.observer.on_event(&RunEvent::AttemptFailed {
                attempt,
                exit_code: err.exit_code(),
                error: err.to_string(),
            });

            if cancel.is_cancelled() || !err.is_retry_eligible() || attempt >= max_attempts {
                return Err(err);
            }

            let message = err.to_string();
            let output = err.output();
            let Some(reason) = self
                .matcher
                .find_match(&output.stdout, &output.stderr, Some(&message))
            else {
                return Err(err);
            };

            self.observer.on_event(&RunEvent::RetryScheduled {
                attempt,
                max_attempts,
                reason: reason.to_string(),
                delay: self.options.time_between_retries,
            });

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.observer.on_event(&RunEvent::BackoffInterrupted { attempt });
                    return Err(err);
                }
                _ = sleep(self.options.time_between_retries) => {}
            }

            attempt += 1;
        }
    }

    fn command_line(&self, args: Vec<String>) -> CommandLine {
        CommandLine {
            program: self.options.binary.clone(),
            args,
            dir: self.options.working_dir.clone(),
            env: self.options.env.clone(),
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("options", &self.options)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::config::{DEFAULT_BINARY, DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT};
    use crate::errors::TfrunnerError;
    use crate::vars::Value;

    #[test]
    fn new_applies_defaults() {
        let runner = Runner::new(&Options::new("/tmp")).unwrap();
        assert_eq!(runner.options().binary, PathBuf::from(DEFAULT_BINARY));
        assert_eq!(
            runner.options().graceful_shutdown_timeout,
            DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT
        );
    }

    #[test]
    fn new_rejects_invalid_pattern() {
        let mut opts = Options::new("/tmp");
        opts.retry_patterns = HashMap::from([("[invalid".to_string(), "bad".to_string())]);
        let err = Runner::new(&opts).unwrap_err();
        assert!(matches!(err, TfrunnerError::InvalidRetryPattern { .. }));
    }

    #[test]
    fn init_args() {
        let mut opts = Options::new("/tmp");
        assert_eq!(Runner::new(&opts).unwrap().init_args(), vec!["init", "-input=false"]);

        opts.disable_color = true;
        assert_eq!(
            Runner::new(&opts).unwrap().init_args(),
            vec!["init", "-input=false", "-no-color"]
        );
    }

    #[test]
    fn apply_and_destroy_args() {
        let mut opts = Options::new("/tmp");
        opts.disable_color = true;
        opts.var_files = vec![PathBuf::from("a.tfvars"), PathBuf::from("b.tfvars")];
        opts.variables = HashMap::from([
            ("zone".to_string(), Value::from("b")),
            ("count".to_string(), Value::from(2)),
        ]);
        let runner = Runner::new(&opts).unwrap();

        assert_eq!(
            runner.apply_args(),
            vec![
                "apply",
                "-input=false",
                "-auto-approve",
                "-no-color",
                "-var-file=a.tfvars",
                "-var-file=b.tfvars",
                "-var",
                "count=2",
                "-var",
                "zone=\"b\"",
            ]
        );
        assert_eq!(runner.destroy_args()[0], "destroy");
        assert_eq!(&runner.destroy_args()[1..], &runner.apply_args()[1..]);
    }

    #[tokio::test]
    async fn already_cancelled_call_never_launches() {
        let runner = Runner::new(&Options::new("/tmp")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner.run(&cancel, ["version"]).await.unwrap_err();
        assert!(matches!(err, RunError::Cancelled { .. }));
        assert_eq!(err.exit_code(), -1);
    }
}
