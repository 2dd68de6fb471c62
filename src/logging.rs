//! # Logging
//!
//! Initializes the `tracing` subscriber with environment-based filtering via
//! `RUST_LOG`.
//!
//! All log output is written to stderr so that stdout carries only the
//! signatures and status lines meant for the user.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. `default_level` applies when
/// `RUST_LOG` is not set, e.g. `"warn"` or `"signet=debug"`.
pub fn init_logging(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    tracing::debug!("logging initialized");
}
