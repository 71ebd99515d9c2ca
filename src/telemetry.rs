//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::RuntimeConfig;

/// Filter used when the configured directive cannot be parsed.
const FALLBACK_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `filter` when set. Returns `false` if a
/// subscriber was already installed (for example by an earlier test).
pub fn init_tracing(filter: &str, json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let json_layer = json.then(|| fmt::layer().json().with_current_span(false));
    let plain_layer = (!json).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .is_ok()
}

/// Install the global tracing subscriber from runtime configuration.
pub fn init_from_config(config: &RuntimeConfig) -> bool {
    init_tracing(&config.log_level, config.log_json)
}
