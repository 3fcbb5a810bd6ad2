//! Configuration validation.
//!
//! # Responsibilities
//! - Convert raw values into typed settings (integers, ports, booleans, strings)
//! - Enforce ranges and capacity bounds per key
//! - Check cross-field invariants on the assembled snapshot
//!
//! # Design Decisions
//! - Converters are pure functions: `(key, raw) → Result<T, ValidationError>`
//! - Strings over capacity are rejected, never truncated
//! - Unknown `allowedModes` bits are rejected, never masked

use std::net::Ipv4Addr;
use std::num::IntErrorKind;
use thiserror::Error;

use crate::config::schema::{
    AllowedModes, LoggingLevel, RepeaterConfig, RepeaterMode, MAX_HOST_LEN, MAX_LOGGING_LEVEL,
    MAX_USER_LEN,
};

/// A recognized key whose value failed conversion or a range/capacity check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ValidationError {
    /// Canonical key name, e.g. `maxSessions`.
    pub key: &'static str,
    /// Offending raw value (or the offending list entry).
    pub value: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(key: &'static str, value: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            key,
            value: value.into(),
            reason,
        }
    }
}

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("not an integer")]
    NotAnInteger,

    #[error("out of range (expected {min}..={max})")]
    OutOfRange { min: u64, max: u64 },

    #[error("not a boolean (expected 0/1, true/false, yes/no, on/off)")]
    NotABoolean,

    #[error("empty value")]
    Empty,

    #[error("longer than {max} bytes")]
    TooLong { max: usize },

    #[error("contains control characters")]
    ControlCharacter,

    #[error("not a dotted-quad address or hostname")]
    InvalidHost,

    #[error("not a valid account name")]
    InvalidUserName,

    #[error("unknown mode bits (expected 1, 2 or 3)")]
    UnknownModes,

    #[error("duplicate entry")]
    DuplicateEntry,

    #[error("capacity of {max} entries exceeded")]
    CapacityExceeded { max: usize },

    #[error("specified more than once")]
    Repeated,
}

/// A cross-field invariant that does not hold on an otherwise valid snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("requireListedId is enabled but idList is empty")]
    EmptyRequiredIdList,

    /// `defaulted` names the side that was not written in the file, if exactly one.
    #[error("viewerPort and serverPort are both {port}{}", defaulted_note(.defaulted))]
    PortClash {
        port: u16,
        defaulted: Option<&'static str>,
    },
}

fn defaulted_note(defaulted: &Option<&'static str>) -> String {
    match defaulted {
        Some(key) => format!(" ({key} was not set and took its default)"),
        None => String::new(),
    }
}

/// A legal setting that is probably not what the operator meant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Advisory {
    #[error("requireListedId has no effect while mode 2 is not allowed (allowedModes = {allowed_modes})")]
    ListedIdWithoutIdMode { allowed_modes: u8 },

    #[error("useHttpForEventListener is set but the event interface is disabled")]
    HttpWithoutEvents,

    #[error("line {line}: ignoring unknown key {key:?} in section [{section}]")]
    UnknownKey {
        line: usize,
        section: &'static str,
        key: String,
    },
}

/// Parse a base-10 integer within `min..=max`.
pub fn parse_integer(key: &'static str, raw: &str, min: u64, max: u64) -> Result<u64, ValidationError> {
    let out_of_range = || ValidationError::new(key, raw, ValidationReason::OutOfRange { min, max });

    match raw.parse::<i64>() {
        Ok(v) if v >= 0 && (min..=max).contains(&(v as u64)) => Ok(v as u64),
        Ok(_) => Err(out_of_range()),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(out_of_range())
        }
        Err(_) => Err(ValidationError::new(key, raw, ValidationReason::NotAnInteger)),
    }
}

/// Parse a TCP port in `1..=65535`.
pub fn parse_port(key: &'static str, raw: &str) -> Result<u16, ValidationError> {
    parse_integer(key, raw, 1, u16::MAX as u64).map(|v| v as u16)
}

pub fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ValidationError> {
    parse_integer(key, raw, 0, u32::MAX as u64).map(|v| v as u32)
}

/// Parse a boolean token, case-insensitive.
pub fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ValidationError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::new(key, raw, ValidationReason::NotABoolean)),
    }
}

pub fn parse_allowed_modes(key: &'static str, raw: &str) -> Result<AllowedModes, ValidationError> {
    let bits = parse_integer(key, raw, 0, u8::MAX as u64)?;
    AllowedModes::from_bits(bits as u8)
        .ok_or_else(|| ValidationError::new(key, raw, ValidationReason::UnknownModes))
}

pub fn parse_logging_level(key: &'static str, raw: &str) -> Result<LoggingLevel, ValidationError> {
    let level = parse_integer(key, raw, 0, MAX_LOGGING_LEVEL as u64)?;
    LoggingLevel::new(level as u8).ok_or_else(|| {
        ValidationError::new(
            key,
            raw,
            ValidationReason::OutOfRange {
                min: 0,
                max: MAX_LOGGING_LEVEL as u64,
            },
        )
    })
}

/// Split an ID list value on commas and whitespace and parse each entry.
///
/// Duplicate and capacity checks happen when entries are added to the list.
pub fn parse_id_entries(key: &'static str, raw: &str) -> Result<Vec<u32>, ValidationError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_integer(key, entry, 1, u32::MAX as u64).map(|v| v as u32))
        .collect()
}

/// Validate a host field: bounded, printable, and a dotted quad or hostname.
pub fn parse_host(key: &'static str, raw: &str) -> Result<String, ValidationError> {
    check_bounded(key, raw, MAX_HOST_LEN)?;
    if raw.parse::<Ipv4Addr>().is_ok() || is_hostname(raw) {
        Ok(raw.to_string())
    } else {
        Err(ValidationError::new(key, raw, ValidationReason::InvalidHost))
    }
}

/// Validate an OS account name.
pub fn parse_user(key: &'static str, raw: &str) -> Result<String, ValidationError> {
    check_bounded(key, raw, MAX_USER_LEN)?;
    if raw.contains(|c: char| c.is_whitespace() || c == ':' || c == '/') {
        return Err(ValidationError::new(key, raw, ValidationReason::InvalidUserName));
    }
    Ok(raw.to_string())
}

fn check_bounded(key: &'static str, raw: &str, max: usize) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::new(key, raw, ValidationReason::Empty));
    }
    if raw.len() > max {
        return Err(ValidationError::new(key, raw, ValidationReason::TooLong { max }));
    }
    if raw.chars().any(char::is_control) {
        return Err(ValidationError::new(key, raw, ValidationReason::ControlCharacter));
    }
    Ok(())
}

fn is_hostname(s: &str) -> bool {
    let labels: Vec<&str> = s.split('.').collect();
    let well_formed = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    // All-numeric names are failed dotted quads, not hostnames.
    let all_numeric = labels
        .iter()
        .all(|label| label.chars().all(|c| c.is_ascii_digit()));
    well_formed && !all_numeric
}

/// Check invariants that span several fields.
pub fn validate_config(config: &RepeaterConfig) -> Result<(), InvariantViolation> {
    if config.require_listed_id && config.id_list.is_empty() {
        return Err(InvariantViolation::EmptyRequiredIdList);
    }
    if config.viewer_port == config.server_port {
        return Err(InvariantViolation::PortClash {
            port: config.viewer_port,
            defaulted: None,
        });
    }
    Ok(())
}

/// Settings that pass validation but contradict each other.
pub fn advisories(config: &RepeaterConfig) -> Vec<Advisory> {
    let mut found = Vec::new();
    if config.require_listed_id && !config.allowed_modes.contains(RepeaterMode::IdBased) {
        found.push(Advisory::ListedIdWithoutIdMode {
            allowed_modes: config.allowed_modes.bits(),
        });
    }
    if config.use_http_for_event_listener && !config.use_event_interface {
        found.push(Advisory::HttpWithoutEvents);
    }
    found
}

/// Log every advisory as a warning.
pub fn warn_on_suspicious(found: &[Advisory]) {
    for advisory in found {
        tracing::warn!("{advisory}");
    }
}
