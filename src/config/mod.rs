//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (INI)
//!     → parser.rs (tokenize: sections, key = value, comments)
//!     → loader.rs (dispatch recognized keys, apply defaults)
//!     → validation.rs (conversion, ranges, cross-field checks)
//!     → RepeaterConfig (validated, immutable)
//!     → install() publishes it once for the process
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - Every field has a named default constant
//! - A snapshot is built completely before anything can observe it

pub mod loader;
pub mod parser;
pub mod schema;
pub mod validation;

use std::sync::OnceLock;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AllowedModes, IdList, LoggingLevel, RepeaterConfig, RepeaterMode};
pub use validation::{Advisory, InvariantViolation, ValidationError, ValidationReason};

static INSTALLED: OnceLock<RepeaterConfig> = OnceLock::new();

/// Publish the process-wide snapshot.
///
/// Succeeds exactly once; later calls return [`ConfigError::AlreadyInstalled`]
/// and leave the published snapshot untouched.
pub fn install(config: RepeaterConfig) -> Result<&'static RepeaterConfig, ConfigError> {
    let mut fresh = false;
    let snapshot = INSTALLED.get_or_init(|| {
        fresh = true;
        config
    });
    if fresh {
        Ok(snapshot)
    } else {
        Err(ConfigError::AlreadyInstalled)
    }
}

/// The published snapshot, if [`install`] has run.
pub fn installed() -> Option<&'static RepeaterConfig> {
    INSTALLED.get()
}
