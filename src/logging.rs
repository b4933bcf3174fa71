//! Logging setup.

use env_logger::{Builder, Env};

/// Initializes `env_logger`. `RUST_LOG` overrides `default_level`.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_logging(default_level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}
