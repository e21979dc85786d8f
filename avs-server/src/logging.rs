//! Tracing setup
//!
//! The subscriber is installed before the config file is read so that
//! config loading can log. The configured `logging.level` is swapped in
//! afterwards through a reload handle; `RUST_LOG` always wins.

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Filter used until the config is loaded
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle to the installed, reloadable log filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Reloadable filter layer starting at `initial`. When `from_env` is set
    /// the filter came from `RUST_LOG` and the configured level is ignored.
    pub fn new(initial: EnvFilter, from_env: bool) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let (layer, handle) = reload::Layer::new(initial);
        (layer, Self { handle, from_env })
    }

    /// Replace the startup filter with the configured level
    pub fn apply_configured_level(&self, level: &str) -> Result<()> {
        if self.from_env {
            return Ok(());
        }
        match EnvFilter::try_new(level) {
            Ok(filter) => self
                .handle
                .reload(filter)
                .context("Failed to apply configured log level"),
            Err(e) => {
                warn!("Ignoring invalid logging.level {:?}: {}", level, e);
                Ok(())
            }
        }
    }
}

/// Install the global subscriber filtered by `RUST_LOG`, else [`DEFAULT_LOG_LEVEL`]
pub fn init() -> LogFilter {
    let (initial, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_LEVEL), false),
    };
    let (layer, filter) = LogFilter::new(initial, from_env);
    tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .init();
    filter
}
