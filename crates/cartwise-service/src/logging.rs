//! Tracing bootstrap.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cartwise_db=trace` - Show trace for the storage crate only
/// - Default: `default_directive` (usually [`ServiceConfig::log_filter`])
///
/// Returns `false` when a subscriber was already installed, which happens
/// when several tests or embedders initialize logging.
///
/// [`ServiceConfig::log_filter`]: crate::ServiceConfig::log_filter
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("info,sqlx=warn");
        assert!(!init_tracing("debug"));
    }
}
