//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`. Installing twice is
//! harmless: the second call reports `false` and leaves the first subscriber in
//! place, so every test binary may call [`init`] from its setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable subscriber. Returns whether this call installed it.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber for CI log collection
pub fn init_json() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .is_ok()
}
