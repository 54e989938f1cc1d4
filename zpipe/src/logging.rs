//! Tracing subscriber setup for the binaries and tests.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"` or
/// `"zpipe=debug"`) is used as the filter directive. Does nothing if a
/// subscriber is already installed.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

/// Development helper: initialize tracing only when `RUST_LOG` is set.
///
/// Tests call this to get logs while debugging; it is a no-op otherwise or
/// when a global subscriber is already installed.
pub fn init_from_env() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
