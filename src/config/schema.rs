//! Configuration schema definitions.
//!
//! This module defines the complete runtime configuration of the repeater.
//! Every field has a documented default constant so that a minimal file
//! (or no recognized keys at all) still yields a fully populated snapshot.

use serde::Serialize;
use std::fmt;

/// Default TCP port for the viewer-facing listener.
pub const DEFAULT_VIEWER_PORT: u16 = 5900;

/// Default TCP port for the server-facing listener.
pub const DEFAULT_SERVER_PORT: u16 = 5500;

/// Default pairing modes (direct and ID-based).
pub const DEFAULT_ALLOWED_MODES: AllowedModes = AllowedModes::ALL;

/// Default logging verbosity (errors and warnings only).
pub const DEFAULT_LOGGING_LEVEL: LoggingLevel = LoggingLevel::QUIET;

pub const DEFAULT_USE_EVENT_INTERFACE: bool = false;

pub const DEFAULT_REQUIRE_LISTED_ID: bool = false;

/// Default session cap; 0 means unlimited.
pub const DEFAULT_MAX_SESSIONS: u32 = 0;

/// Default advertised address (all interfaces).
pub const DEFAULT_OWN_IP_ADDRESS: &str = "0.0.0.0";

/// Default account to drop privileges to after binding.
pub const DEFAULT_RUN_AS_USER: &str = "uvncrep";

pub const DEFAULT_EVENT_LISTENER_HOST: &str = "localhost";

pub const DEFAULT_EVENT_LISTENER_PORT: u16 = 2002;

pub const DEFAULT_USE_HTTP_FOR_EVENT_LISTENER: bool = false;

/// Maximum number of entries in the ID allow-list.
pub const MAX_ID_LIST_LEN: usize = 100;

/// Maximum length in bytes of host fields (`ownIpAddress`, `eventListenerHost`).
pub const MAX_HOST_LEN: usize = 255;

/// Maximum length in bytes of `runAsUser`.
pub const MAX_USER_LEN: usize = 32;

/// Highest accepted logging level.
pub const MAX_LOGGING_LEVEL: u8 = 3;

/// Root configuration snapshot for the repeater.
///
/// Produced once by the loader and never mutated afterwards. Downstream
/// components (listeners, admission control, privilege drop, event dispatch)
/// read it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeaterConfig {
    /// TCP port the viewer-facing listener binds to.
    pub viewer_port: u16,

    /// TCP port the server-facing listener binds to.
    pub server_port: u16,

    /// Which pairing modes are permitted.
    pub allowed_modes: AllowedModes,

    /// Verbosity threshold for diagnostic output.
    pub logging_level: LoggingLevel,

    /// Whether external event notifications are emitted.
    pub use_event_interface: bool,

    /// Whether session admission requires the ID to be in `id_list`.
    pub require_listed_id: bool,

    /// Cap on concurrently active sessions (0 = unlimited).
    pub max_sessions: u32,

    /// Explicit allow-list of admissible connection IDs.
    pub id_list: IdList,

    /// Externally advertised address for ID-based addressing.
    pub own_ip_address: String,

    /// OS account to drop privileges to after binding.
    pub run_as_user: String,

    /// Destination host for event notifications.
    pub event_listener_host: String,

    /// Destination port for event notifications.
    pub event_listener_port: u16,

    /// HTTP transport for events instead of a raw socket.
    pub use_http_for_event_listener: bool,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            viewer_port: DEFAULT_VIEWER_PORT,
            server_port: DEFAULT_SERVER_PORT,
            allowed_modes: DEFAULT_ALLOWED_MODES,
            logging_level: DEFAULT_LOGGING_LEVEL,
            use_event_interface: DEFAULT_USE_EVENT_INTERFACE,
            require_listed_id: DEFAULT_REQUIRE_LISTED_ID,
            max_sessions: DEFAULT_MAX_SESSIONS,
            id_list: IdList::new(),
            own_ip_address: DEFAULT_OWN_IP_ADDRESS.to_string(),
            run_as_user: DEFAULT_RUN_AS_USER.to_string(),
            event_listener_host: DEFAULT_EVENT_LISTENER_HOST.to_string(),
            event_listener_port: DEFAULT_EVENT_LISTENER_PORT,
            use_http_for_event_listener: DEFAULT_USE_HTTP_FOR_EVENT_LISTENER,
        }
    }
}

/// Connection-pairing mode of the repeater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeaterMode {
    /// Mode 1: the viewer names the server's host and port.
    Direct,
    /// Mode 2: viewer and server rendezvous on a numeric connection ID.
    IdBased,
}

impl RepeaterMode {
    /// Bit this mode occupies in an [`AllowedModes`] mask.
    pub const fn bit(self) -> u8 {
        match self {
            RepeaterMode::Direct => 0b01,
            RepeaterMode::IdBased => 0b10,
        }
    }
}

impl fmt::Display for RepeaterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeaterMode::Direct => write!(f, "mode 1 (direct)"),
            RepeaterMode::IdBased => write!(f, "mode 2 (id-based)"),
        }
    }
}

/// Bitmask of permitted [`RepeaterMode`]s.
///
/// Only non-empty masks made of known bits can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AllowedModes(u8);

impl AllowedModes {
    pub const DIRECT: AllowedModes = AllowedModes(0b01);
    pub const ID_BASED: AllowedModes = AllowedModes(0b10);
    pub const ALL: AllowedModes = AllowedModes(0b11);

    /// Build a mask from raw bits. Returns `None` for an empty mask or unknown bits.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::ALL.0 != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, mode: RepeaterMode) -> bool {
        self.0 & mode.bit() != 0
    }
}

/// Diagnostic verbosity, 0 (quiet) through [`MAX_LOGGING_LEVEL`] (trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LoggingLevel(u8);

impl LoggingLevel {
    pub const QUIET: LoggingLevel = LoggingLevel(0);
    pub const INFO: LoggingLevel = LoggingLevel(1);
    pub const DEBUG: LoggingLevel = LoggingLevel(2);
    pub const TRACE: LoggingLevel = LoggingLevel(3);

    pub const fn new(level: u8) -> Option<Self> {
        if level > MAX_LOGGING_LEVEL {
            None
        } else {
            Some(Self(level))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Error returned when an ID cannot be added to an [`IdList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdListError {
    Duplicate(u32),
    CapacityExceeded,
}

/// Ordered, duplicate-free allow-list of connection IDs.
///
/// Bounded by [`MAX_ID_LIST_LEN`]. Insertion order is kept for reporting;
/// membership checks ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdList(Vec<u32>);

impl IdList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an ID, rejecting duplicates and overflow.
    pub fn push(&mut self, id: u32) -> Result<(), IdListError> {
        if self.0.contains(&id) {
            return Err(IdListError::Duplicate(id));
        }
        if self.0.len() >= MAX_ID_LIST_LEN {
            return Err(IdListError::CapacityExceeded);
        }
        self.0.push(id);
        Ok(())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}
