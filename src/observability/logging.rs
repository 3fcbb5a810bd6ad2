//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Translate the configured `loggingLevel` into a filter directive
//! - Narrow or widen the filter after the configuration is loaded

use thiserror::Error;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, util::TryInitError, EnvFilter,
    Registry,
};

use crate::config::LoggingLevel;

/// Target prefix of this crate's events.
const CRATE_TARGET: &str = "repeater_config";

/// Filter used until a configuration has been loaded.
pub const BOOTSTRAP_DIRECTIVE: &str = "repeater_config=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),

    #[error("failed to update log filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Map a configured level to an `EnvFilter` directive.
pub fn filter_directive(level: LoggingLevel) -> String {
    let severity = match level.get() {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("{CRATE_TARGET}={severity}")
}

/// Handle to the installed subscriber's filter.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Apply the configured level unless `RUST_LOG` chose the filter.
    pub fn apply_level(&self, level: LoggingLevel) -> Result<(), LoggingError> {
        if self.from_env {
            tracing::debug!("RUST_LOG is set; ignoring loggingLevel");
            return Ok(());
        }
        self.filter.reload(EnvFilter::new(filter_directive(level)))?;
        tracing::debug!(level = level.get(), "Log level applied");
        Ok(())
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Uses `RUST_LOG` when set, otherwise [`BOOTSTRAP_DIRECTIVE`].
pub fn init() -> Result<LogHandle, LoggingError> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(BOOTSTRAP_DIRECTIVE), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(LogHandle {
        filter: handle,
        from_env,
    })
}
