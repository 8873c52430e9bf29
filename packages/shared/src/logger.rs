//! Logging setup utilities for the load simulator.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for both the simulator crate and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "nigiwai")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use nigiwai_shared::logger::setup_logger;
///
/// setup_logger("nigiwai", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Build the fallback filter directive used when `RUST_LOG` is not set.
///
/// Both the library crate and the binary are enabled at the same level;
/// dependencies (reqwest, tungstenite, ...) stay silent.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "nigiwai_simulator={},{}={}",
        default_log_level,
        binary_name.replace('-', "_"),
        default_log_level
    )
}
