//! Tracing subscriber setup for processes embedding the mutation engine
//!
//! Rules and the orchestrator only emit `tracing` events; installing a
//! subscriber is left to the binary. This helper gives webhook servers the
//! same filter and JSON layout everywhere.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,pod_mutator=debug";

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit JSON records instead of human-readable lines
    pub json: bool,
    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: true,
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Build the env filter, preferring `RUST_LOG` over the configured default
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.default_filter)
            .map_err(|e| Error::config(format!("invalid log filter: {}", e))),
    }
}

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed or the filter does not parse.
/// Mutation never depends on this succeeding.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = env_filter(&config)?;

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
    });
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            Error::config(format!("failed to initialize tracing subscriber: {}", e))
        })
}
