//! Configuration loader for a VNC connection repeater.

pub mod admission;
pub mod config;
pub mod observability;

pub use admission::AdmissionPolicy;
pub use config::schema::RepeaterConfig;
pub use config::{load_config, ConfigError};
