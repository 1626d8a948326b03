pub mod builders;
pub mod fake_process;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test and only shown
///   for failing tests (unless you run with `-- --nocapture`).
/// - Runner events are logged at debug by default so a failing test shows
///   every attempt, interrupt and kill.
///
/// Override with e.g. `RUST_LOG=trace cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,tfrunner=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future, failing the test if it takes longer than `limit`.
pub async fn within<F, T>(limit: Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(limit, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {limit:?}"))
}
