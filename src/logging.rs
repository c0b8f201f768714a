//! # Structured Logging
//!
//! Console logging for library consumers that do not install their own
//! `tracing` subscriber. Filtering comes from `RUST_LOG`, falling back to
//! `info`.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging once per process.
///
/// Safe to call from multiple components; if the embedding application has
/// already installed a subscriber, that subscriber wins.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Don't panic if a subscriber is already installed
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
