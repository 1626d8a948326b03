#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tfrunner::config::Options;
use tfrunner::exec::{OutputSink, RunEvent, RunObserver};
use tfrunner::vars::Value;

/// Builder for `Options` with test-friendly timings.
///
/// Defaults: binary `terraform`, 10ms between retries, 500ms graceful
/// shutdown budget.
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        let mut options = Options::new(std::env::temp_dir());
        options.binary = PathBuf::from("terraform");
        options.time_between_retries = Duration::from_millis(10);
        options.graceful_shutdown_timeout = Duration::from_millis(500);
        Self { options }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.working_dir = dir.into();
        self
    }

    pub fn binary(mut self, binary: &str) -> Self {
        self.options.binary = PathBuf::from(binary);
        self
    }

    pub fn retry(mut self, pattern: &str, description: &str) -> Self {
        self.options
            .retry_patterns
            .insert(pattern.to_string(), description.to_string());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.options.max_retries = n;
        self
    }

    pub fn time_between_retries(mut self, d: Duration) -> Self {
        self.options.time_between_retries = d;
        self
    }

    pub fn graceful_shutdown_timeout(mut self, d: Duration) -> Self {
        self.options.graceful_shutdown_timeout = d;
        self
    }

    pub fn var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options.variables.insert(name.to_string(), value.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.options.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn stdout_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.options.stdout = Some(sink);
        self
    }

    pub fn stderr_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.options.stderr = Some(sink);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
