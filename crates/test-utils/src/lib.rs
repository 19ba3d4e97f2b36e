//! Shared helpers for mirrorsync's integration and property tests.

pub mod fakes;
pub mod fixture;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use mirrorsync::logging::LOG_ENV_VAR;

pub use fakes::{RecordingBackend, RecordingRegistrar};
pub use fixture::MirrorFixture;

static INIT: Once = Once::new();

/// Upper bound for tests that wait on real filesystem notifications.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-captured subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`.
/// The level comes from `MIRRORSYNC_LOG` (e.g. `MIRRORSYNC_LOG=debug`),
/// defaulting to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}
