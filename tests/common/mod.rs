#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tfrunner::config::Options;
use tfrunner::exec::Runner;
pub use tfrunner_test_utils::builders::{OptionsBuilder, RecordingObserver};
pub use tfrunner_test_utils::fake_process::{FakeScript, ScriptedLauncher};
pub use tfrunner_test_utils::{init_tracing, within};

/// Runner wired to a scripted launcher and a recording observer.
pub fn fake_runner(
    options: Options,
    launcher: &Arc<ScriptedLauncher>,
) -> (Runner, Arc<RecordingObserver>) {
    let observer = RecordingObserver::new();
    let runner = Runner::new(&options)
        .expect("valid options")
        .with_launcher(launcher.clone())
        .with_observer(observer.clone());
    (runner, observer)
}

/// Cancel `token` after `delay`, from a background task.
pub fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}
