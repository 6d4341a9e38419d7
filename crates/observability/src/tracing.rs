//! Tracing/logging initialization.
//!
//! The bus logs through `tracing` macros only; installing a subscriber is the
//! application's choice. These helpers cover the two setups used here.

use tracing_subscriber::EnvFilter;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
    /// JSON lines (`true`) or human-readable output (`false`).
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: true,
        }
    }
}

impl TracingConfig {
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &TracingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_thread_names(true)
        .with_target(false);

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = if config.json {
        builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init()
    } else {
        builder.try_init()
    };
}

/// Debug-level, human-readable output routed through the test harness.
///
/// Safe to call from every test (subsequent calls are no-ops).
pub fn init_for_tests() {
    let config = TracingConfig::default()
        .with_default_filter("debug")
        .with_json(false);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_test_writer()
        .try_init();
}
