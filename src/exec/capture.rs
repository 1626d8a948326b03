// src/exec/capture.rs

//! Output capture for a running process.
//!
//! Each stream gets its own copy task which appends to a private buffer and,
//! if configured, forwards every chunk to a pass-through [`OutputSink`] as it
//! arrives. The two tasks are joined, or abandoned once a deadline passes,
//! before a result is built.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::process::BoxedReader;

const CHUNK_SIZE: usize = 8 * 1024;

/// Receives a live copy of a process stream.
///
/// Chunks arrive in emission order for the stream they belong to.
pub trait OutputSink: Send + Sync {
    fn write_chunk(&self, chunk: &[u8]) -> std::io::Result<()>;
}

/// Forwards to this process's own stdout or stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdout,
    Stderr,
}

impl OutputSink for StdStream {
    fn write_chunk(&self, chunk: &[u8]) -> std::io::Result<()> {
        match self {
            StdStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(chunk)?;
                out.flush()
            }
            StdStream::Stderr => std::io::stderr().lock().write_all(chunk),
        }
    }
}

/// Accumulates everything it is handed; handy for tests and for callers that
/// want the live stream without touching the terminal.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&guard).into_owned()
    }
}

impl OutputSink for SharedBuffer {
    fn write_chunk(&self, chunk: &[u8]) -> std::io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(chunk);
        Ok(())
    }
}

/// One stream's copy task and the buffer only it writes to.
pub(crate) struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl Capture {
    /// Start copying `reader` into a fresh buffer (and `sink`, if any).
    pub(crate) fn start(
        stream: &'static str,
        reader: Option<BoxedReader>,
        sink: Option<Arc<dyn OutputSink>>,
    ) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));

        let handle = reader.map(|mut reader| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = vec![0u8; CHUNK_SIZE];
                loop {
                    let n = match reader.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(e) => {
                            debug!(stream, error = %e, "read error; stopping capture");
                            break;
                        }
                    };

                    buffer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]);

                    if let Some(sink) = &sink {
                        if let Err(e) = sink.write_chunk(&chunk[..n]) {
                            debug!(stream, error = %e, "pass-through sink write failed");
                        }
                    }
                }
            })
        });

        Self { buffer, handle }
    }

    /// Wait for the stream to reach EOF.
    ///
    /// Cancel safe: dropping the future leaves the copy task running, and a
    /// later call resumes the wait.
    pub(crate) async fn closed(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let joined = handle.await;
            self.handle = None;
            if let Err(e) = joined {
                debug!(error = %e, "capture task ended abnormally");
            }
        }
    }

    /// Stop copying and return everything read so far.
    ///
    /// A stream that is still open is abandoned: after a force-kill, or
    /// once a drain deadline has passed, orphaned grandchildren may keep the
    /// pipe open indefinitely.
    pub(crate) fn into_text(mut self) -> String {
        if let Some(handle) = self.handle.take() {
            debug!("stream still open; abandoning capture");
            handle.abort();
        }
        self.drain()
    }

    fn drain(&self) -> String {
        let bytes = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
