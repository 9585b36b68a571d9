//! Logging bootstrap.
//!
//! `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` (plain level name)
//! drives the filter, defaulting to `warn` for quiet operation.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging. Safe to call more than once; only the first call
/// takes effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
            EnvFilter::new(level)
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
