//! Logging setup for test suites
//!
//! Mirrors the daemon-style init: `EnvFilter` from `RUST_LOG` (default
//! `clustertest=info`) and a pretty or JSON fmt layer picked by
//! `CLUSTERTEST_LOG_FORMAT`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting `json` or `pretty` output
pub const LOG_FORMAT_ENV: &str = "CLUSTERTEST_LOG_FORMAT";

const DEFAULT_FILTER: &str = "clustertest=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed, so calling this
/// from every test is fine.
pub fn init_logging() -> bool {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().json())
            .try_init()
            .is_ok(),
        _ => tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().pretty())
            .try_init()
            .is_ok(),
    }
}

/// Like `init_logging`, but routes output through libtest's capture
pub fn init_test_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_test_writer())
        .try_init()
        .is_ok()
}
