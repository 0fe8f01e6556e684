//! Structured logging setup for checker debugging.
//!
//! The driver and explorer emit `tracing` events (per-step dispatch at
//! TRACE, per-run progress at DEBUG, exploration summaries at INFO).
//! These initializers install a terminal subscriber with a sensible
//! filter; `RUST_LOG` overrides it when set, e.g.:
//!
//! ```bash
//! RUST_LOG=tangle_core::driver=trace cargo run --example cas_counter
//! ```

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at the default `info` level.
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Initialize logging at a specific level: `"trace"`, `"debug"`,
/// `"info"`, `"warn"` or `"error"`.
///
/// Panics if a global subscriber is already installed.
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tangle_core={level},tangle_explore={level}").into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
