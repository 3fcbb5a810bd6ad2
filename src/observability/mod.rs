//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! logging.rs:
//!     → stderr subscriber, bootstrap filter before the config exists
//!     → filter narrowed to loggingLevel once the snapshot is loaded
//! ```
//!
//! # Design Decisions
//! - RUST_LOG always wins over loggingLevel
//! - The filter is swapped in place; the subscriber is installed once

pub mod logging;
