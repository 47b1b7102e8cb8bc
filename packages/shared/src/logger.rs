//! Logging setup utilities for the Beacon binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default filter enables `default_log_level` for the calling binary and for
/// every Beacon library crate (plus `tower_http` request tracing). It can be overridden with the `RUST_LOG`
/// environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "beacon-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use beacon_shared::logger::setup_logger;
///
/// setup_logger("beacon-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let default_filter = [
        binary_name.replace('-', "_"),
        "beacon_shared".to_string(),
        "beacon_server".to_string(),
        "beacon_client".to_string(),
        "tower_http".to_string(),
    ]
    .iter()
    .map(|target| format!("{}={}", target, default_log_level))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
