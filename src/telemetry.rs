//! Logging setup.
//!
//! Events and spans go through `tracing`; this installs a formatting
//! subscriber filtered by `RUST_LOG`, or by `fallback` when it is unset.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Later calls are no-ops, so tests and
/// embedding binaries may call it freely.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
