//! Shared fixtures for the `org-node-e2e` test suites: scripted readers and
//! launchers, a recording sink and canned log lines.

pub mod builders;
pub mod chunked;
pub mod fake_launcher;
pub mod memory_sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use org_node_e2e::logging::LOG_LEVEL_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests unless run with `--nocapture`. The filter is read from the same
/// variable the binary uses, e.g. `ORG_NODE_E2E_LOG=org_node_e2e=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| EnvFilter::new("warn,org_node_e2e=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
///
/// A hung orchestration shows up as a failed test instead of a stuck run.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("test step did not finish within {TEST_TIMEOUT:?}"),
    }
}
