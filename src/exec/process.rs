// src/exec/process.rs

//! Process launching behind a small capability interface.
//!
//! The attempt state machine only ever talks to [`Launcher`] and
//! [`Subprocess`]; everything platform-specific (signals, exit-status
//! decoding) lives in [`TokioLauncher`]. Tests substitute a scripted fake.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use super::output::RUNNER_EXIT_CODE;

pub type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = io::Result<i32>> + Send + 'a>>;

/// Fully resolved invocation: program, arguments, directory, env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub dir: PathBuf,
    /// Overlaid on the inherited environment.
    pub env: HashMap<String, String>,
}

impl CommandLine {
    /// `program arg1 arg2 ...`, for logs.
    pub fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

/// A started process plus its output pipes.
pub struct Spawned {
    pub process: Box<dyn Subprocess>,
    pub stdout: Option<BoxedReader>,
    pub stderr: Option<BoxedReader>,
}

/// Control over one running process.
pub trait Subprocess: Send {
    /// Resolve with the exit code once the process has exited and been
    /// reaped. Must be cancel safe: dropping the future and calling again
    /// is allowed.
    fn wait(&mut self) -> WaitFuture<'_>;

    /// Ask the process to shut down cooperatively (SIGINT on Unix).
    fn request_graceful_stop(&mut self) -> io::Result<()>;

    /// Kill the process unconditionally. Does not wait.
    fn force_stop(&mut self) -> io::Result<()>;
}

/// Starts processes.
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &CommandLine) -> io::Result<Spawned>;
}

/// Real launcher built on `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl Launcher for TokioLauncher {
    fn launch(&self, command: &CommandLine) -> io::Result<Spawned> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !command.dir.as_os_str().is_empty() {
            cmd.current_dir(&command.dir);
        }

        // Own process group: a terminal Ctrl-C must reach the tool only as
        // the runner's single interrupt, never twice.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take().map(|s| Box::pin(s) as BoxedReader);
        let stderr = child.stderr.take().map(|s| Box::pin(s) as BoxedReader);

        Ok(Spawned {
            process: Box::new(TokioProcess { child }),
            stdout,
            stderr,
        })
    }
}

struct TokioProcess {
    child: Child,
}

impl Subprocess for TokioProcess {
    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move { self.child.wait().await.map(exit_code) })
    }

    #[cfg(unix)]
    fn request_graceful_stop(&mut self) -> io::Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // No pid means the child was already reaped; nothing to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        kill(Pid::from_raw(pid), Signal::SIGINT).map_err(io::Error::from)
    }

    // No portable interrupt for a single child elsewhere.
    #[cfg(not(unix))]
    fn request_graceful_stop(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn force_stop(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Decode an exit status. Signal deaths map to `128 + signo` like a shell.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    RUNNER_EXIT_CODE
}
