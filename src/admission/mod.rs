//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! RepeaterConfig (read-only)
//!     → policy.rs (AdmissionPolicy built once at startup)
//!
//! Per incoming pairing request:
//!     → check_mode (is the pairing mode allowed?)
//!     → check_id (is the connection ID listed, when listing is required?)
//!     → check_session_capacity (is there room for one more session?)
//! ```
//!
//! # Design Decisions
//! - Decisions are pure: no I/O, no shared mutable state
//! - Fail closed: any failed check denies the session

pub mod policy;

pub use policy::{AdmissionDenied, AdmissionPolicy};
