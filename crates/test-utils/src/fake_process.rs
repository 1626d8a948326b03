use std::collections::VecDeque;
use std::io;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tfrunner::exec::{BoxedReader, CommandLine, Launcher, Spawned, Subprocess, WaitFuture};
use tokio::time::Instant;

/// Exit code a fake process reports after `force_stop` (128 + SIGKILL).
pub const KILLED_EXIT_CODE: i32 = 137;

/// What one fake process does.
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// `None` runs until stopped.
    pub runs_for: Option<Duration>,
    /// Exit `(after, code)` once interrupted; `None` ignores interrupts.
    pub on_interrupt: Option<(Duration, i32)>,
    /// Fail the launch itself with this message.
    pub spawn_error: Option<String>,
}

impl FakeScript {
    /// Exits immediately with `code`.
    pub fn exits(code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: code,
            runs_for: Some(Duration::ZERO),
            on_interrupt: None,
            spawn_error: None,
        }
    }

    /// Never exits on its own and ignores interrupts.
    pub fn hangs() -> Self {
        Self {
            runs_for: None,
            ..Self::exits(0)
        }
    }

    pub fn spawn_failure(message: &str) -> Self {
        Self {
            spawn_error: Some(message.to_string()),
            ..Self::exits(0)
        }
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.stdout = text.to_string();
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.stderr = text.to_string();
        self
    }

    pub fn runs_for(mut self, d: Duration) -> Self {
        self.runs_for = Some(d);
        self
    }

    pub fn exits_on_interrupt(mut self, after: Duration, code: i32) -> Self {
        self.on_interrupt = Some((after, code));
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    interrupts: AtomicUsize,
    kills: AtomicUsize,
}

/// A launcher that hands out scripted fake processes, in order.
///
/// Once the queue is empty, every further launch uses the fallback script.
/// Every launched command line is recorded.
#[derive(Debug)]
pub struct ScriptedLauncher {
    scripts: Mutex<VecDeque<FakeScript>>,
    fallback: FakeScript,
    launched: Mutex<Vec<CommandLine>>,
    counters: Arc<Counters>,
}

impl ScriptedLauncher {
    pub fn new(scripts: Vec<FakeScript>) -> Arc<Self> {
        Self::with_fallback(scripts, FakeScript::exits(0))
    }

    pub fn with_fallback(scripts: Vec<FakeScript>, fallback: FakeScript) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            fallback,
            launched: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Repeat `script` for every launch.
    pub fn always(script: FakeScript) -> Arc<Self> {
        Self::with_fallback(Vec::new(), script)
    }

    pub fn launched(&self) -> Vec<CommandLine> {
        self.launched.lock().unwrap().clone()
    }

    /// Arguments of every launch, for easy comparison.
    pub fn launched_args(&self) -> Vec<Vec<String>> {
        self.launched().into_iter().map(|c| c.args).collect()
    }

    pub fn launch_count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }

    pub fn interrupts(&self) -> usize {
        self.counters.interrupts.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.counters.kills.load(Ordering::SeqCst)
    }
}

impl Launcher for ScriptedLauncher {
    fn launch(&self, command: &CommandLine) -> io::Result<Spawned> {
        self.launched.lock().unwrap().push(command.clone());

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(message) = &script.spawn_error {
            return Err(io::Error::new(io::ErrorKind::NotFound, message.clone()));
        }

        let stdout: BoxedReader = Box::pin(Cursor::new(script.stdout.clone().into_bytes()));
        let stderr: BoxedReader = Box::pin(Cursor::new(script.stderr.clone().into_bytes()));

        Ok(Spawned {
            process: Box::new(FakeProcess {
                script,
                started: Instant::now(),
                interrupted_at: None,
                killed: false,
                counters: Arc::clone(&self.counters),
            }),
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }
}

struct FakeProcess {
    script: FakeScript,
    started: Instant,
    interrupted_at: Option<Instant>,
    killed: bool,
    counters: Arc<Counters>,
}

impl Subprocess for FakeProcess {
    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move {
            if self.killed {
                return Ok(KILLED_EXIT_CODE);
            }

            let natural = self.script.runs_for.map(|d| (self.started + d, self.script.exit_code));
            let on_stop = match (self.interrupted_at, self.script.on_interrupt) {
                (Some(at), Some((after, code))) => Some((at + after, code)),
                _ => None,
            };

            let (deadline, code) = match (natural, on_stop) {
                (Some(n), Some(s)) => {
                    if s.0 < n.0 {
                        s
                    } else {
                        n
                    }
                }
                (Some(n), None) => n,
                (None, Some(s)) => s,
                (None, None) => return std::future::pending().await,
            };

            tokio::time::sleep_until(deadline).await;
            Ok(code)
        })
    }

    fn request_graceful_stop(&mut self) -> io::Result<()> {
        self.counters.interrupts.fetch_add(1, Ordering::SeqCst);
        if self.interrupted_at.is_none() {
            self.interrupted_at = Some(Instant::now());
        }
        Ok(())
    }

    fn force_stop(&mut self) -> io::Result<()> {
        self.counters.kills.fetch_add(1, Ordering::SeqCst);
        self.killed = true;
        Ok(())
    }
}
