//! Configuration loading from disk.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::parser::{tokenize, Line, Token};
use crate::config::schema::{IdListError, RepeaterConfig, MAX_ID_LIST_LEN};
use crate::config::validation::{
    advisories, parse_allowed_modes, parse_bool, parse_host, parse_id_entries,
    parse_logging_level, parse_port, parse_u32, parse_user, validate_config, warn_on_suspicious,
    Advisory, InvariantViolation, ValidationError, ValidationReason,
};

/// Error type for configuration loading.
///
/// Loading stops at the first error encountered in file order.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("cannot read configuration file {}: {source}", .path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: malformed line {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("inconsistent configuration: {0}")]
    CrossFieldInvariantViolation(#[from] InvariantViolation),

    #[error("a configuration snapshot is already installed")]
    AlreadyInstalled,
}

/// Sections the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Mode2,
    EventInterface,
}

impl Section {
    const ALL: [Section; 3] = [Section::General, Section::Mode2, Section::EventInterface];

    fn name(self) -> &'static str {
        match self {
            Section::General => "general",
            Section::Mode2 => "mode2",
            Section::EventInterface => "eventInterface",
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.name().eq_ignore_ascii_case(name))
    }
}

/// Recognized keys, one per snapshot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    ViewerPort,
    ServerPort,
    AllowedModes,
    LoggingLevel,
    UseEventInterface,
    RequireListedId,
    MaxSessions,
    IdList,
    OwnIpAddress,
    RunAsUser,
    EventListenerHost,
    EventListenerPort,
    UseHttpForEventListener,
}

impl Key {
    const ALL: [Key; 13] = [
        Key::ViewerPort,
        Key::ServerPort,
        Key::AllowedModes,
        Key::LoggingLevel,
        Key::UseEventInterface,
        Key::RequireListedId,
        Key::MaxSessions,
        Key::IdList,
        Key::OwnIpAddress,
        Key::RunAsUser,
        Key::EventListenerHost,
        Key::EventListenerPort,
        Key::UseHttpForEventListener,
    ];

    /// Canonical name, used in errors.
    fn name(self) -> &'static str {
        match self {
            Key::ViewerPort => "viewerPort",
            Key::ServerPort => "serverPort",
            Key::AllowedModes => "allowedModes",
            Key::LoggingLevel => "loggingLevel",
            Key::UseEventInterface => "useEventInterface",
            Key::RequireListedId => "requireListedId",
            Key::MaxSessions => "maxSessions",
            Key::IdList => "idList",
            Key::OwnIpAddress => "ownIpAddress",
            Key::RunAsUser => "runAsUser",
            Key::EventListenerHost => "eventListenerHost",
            Key::EventListenerPort => "eventListenerPort",
            Key::UseHttpForEventListener => "useHttpForEventListener",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Key::IdList => &["id"],
            Key::UseHttpForEventListener => &["useHttp"],
            _ => &[],
        }
    }

    fn section(self) -> Section {
        match self {
            Key::ViewerPort
            | Key::ServerPort
            | Key::AllowedModes
            | Key::LoggingLevel
            | Key::MaxSessions
            | Key::OwnIpAddress
            | Key::RunAsUser => Section::General,
            Key::RequireListedId | Key::IdList => Section::Mode2,
            Key::UseEventInterface
            | Key::EventListenerHost
            | Key::EventListenerPort
            | Key::UseHttpForEventListener => Section::EventInterface,
        }
    }

    fn lookup(section: Section, name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| {
            key.section() == section
                && (key.name().eq_ignore_ascii_case(name)
                    || key.aliases().iter().any(|a| a.eq_ignore_ascii_case(name)))
        })
    }

    /// Keys that may legitimately appear more than once.
    fn accumulates(self) -> bool {
        matches!(self, Key::IdList)
    }
}

/// Where the tokenizer currently is.
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Before the first header.
    Preamble,
    Known(Section),
    Unknown,
}

/// Accumulates converted values on top of the defaults.
///
/// Nothing leaves the builder until every line and invariant has been checked.
struct ConfigBuilder {
    config: RepeaterConfig,
    seen: HashSet<Key>,
    advisories: Vec<Advisory>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            config: RepeaterConfig::default(),
            seen: HashSet::new(),
            advisories: Vec::new(),
        }
    }

    fn apply(&mut self, key: Key, raw: &str) -> Result<(), ValidationError> {
        let name = key.name();
        if !self.seen.insert(key) && !key.accumulates() {
            return Err(ValidationError::new(name, raw, ValidationReason::Repeated));
        }

        let cfg = &mut self.config;
        match key {
            Key::ViewerPort => cfg.viewer_port = parse_port(name, raw)?,
            Key::ServerPort => cfg.server_port = parse_port(name, raw)?,
            Key::AllowedModes => cfg.allowed_modes = parse_allowed_modes(name, raw)?,
            Key::LoggingLevel => cfg.logging_level = parse_logging_level(name, raw)?,
            Key::UseEventInterface => cfg.use_event_interface = parse_bool(name, raw)?,
            Key::RequireListedId => cfg.require_listed_id = parse_bool(name, raw)?,
            Key::MaxSessions => cfg.max_sessions = parse_u32(name, raw)?,
            Key::OwnIpAddress => cfg.own_ip_address = parse_host(name, raw)?,
            Key::RunAsUser => cfg.run_as_user = parse_user(name, raw)?,
            Key::EventListenerHost => cfg.event_listener_host = parse_host(name, raw)?,
            Key::EventListenerPort => cfg.event_listener_port = parse_port(name, raw)?,
            Key::UseHttpForEventListener => {
                cfg.use_http_for_event_listener = parse_bool(name, raw)?
            }
            Key::IdList => {
                for id in parse_id_entries(name, raw)? {
                    cfg.id_list.push(id).map_err(|e| {
                        let reason = match e {
                            IdListError::Duplicate(_) => ValidationReason::DuplicateEntry,
                            IdListError::CapacityExceeded => ValidationReason::CapacityExceeded {
                                max: MAX_ID_LIST_LEN,
                            },
                        };
                        ValidationError::new(name, id.to_string(), reason)
                    })?;
                }
            }
        }
        Ok(())
    }

    fn build(self) -> Result<(RepeaterConfig, Vec<Advisory>), ConfigError> {
        validate_config(&self.config).map_err(|violation| self.explain(violation))?;
        let mut found = self.advisories;
        found.extend(advisories(&self.config));
        Ok((self.config, found))
    }

    /// Attach which side of a port clash came from a default.
    fn explain(&self, violation: InvariantViolation) -> InvariantViolation {
        match violation {
            InvariantViolation::PortClash { port, .. } => {
                let defaulted = match (
                    self.seen.contains(&Key::ViewerPort),
                    self.seen.contains(&Key::ServerPort),
                ) {
                    (true, false) => Some(Key::ServerPort.name()),
                    (false, true) => Some(Key::ViewerPort.name()),
                    _ => None,
                };
                InvariantViolation::PortClash { port, defaulted }
            }
            other => other,
        }
    }
}

fn malformed(token: &Token<'_>) -> ConfigError {
    ConfigError::MalformedLine {
        line: token.line,
        content: token.raw.trim().to_string(),
    }
}

/// Parse and validate configuration text.
///
/// Advisories are logged as warnings; they never fail the load.
pub fn parse_config(text: &str) -> Result<RepeaterConfig, ConfigError> {
    let (config, found) = parse_document(text)?;
    warn_on_suspicious(&found);
    Ok(config)
}

fn parse_document(text: &str) -> Result<(RepeaterConfig, Vec<Advisory>), ConfigError> {
    let mut builder = ConfigBuilder::new();
    let mut scope = Scope::Preamble;

    for token in tokenize(text) {
        match token.kind {
            Line::Blank => {}
            Line::MalformedHeader => return Err(malformed(&token)),
            Line::Section(name) => {
                scope = match Section::lookup(name) {
                    Some(section) => Scope::Known(section),
                    None => {
                        tracing::debug!(line = token.line, section = name, "Skipping unrecognized section");
                        Scope::Unknown
                    }
                };
            }
            Line::Entry { key, value } => {
                let Scope::Known(section) = scope else {
                    continue;
                };
                match Key::lookup(section, key) {
                    Some(k) => builder.apply(k, value)?,
                    None => builder.advisories.push(Advisory::UnknownKey {
                        line: token.line,
                        section: section.name(),
                        key: key.to_string(),
                    }),
                }
            }
            Line::Malformed => {
                if let Scope::Known(_) = scope {
                    return Err(malformed(&token));
                }
            }
        }
    }

    builder.build()
}

/// Load and validate configuration from an INI file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RepeaterConfig, ConfigError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::FileUnreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let text = String::from_utf8(bytes).map_err(|e| ConfigError::FileUnreadable {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;

    let config = parse_config(&text)?;

    tracing::info!(
        path = %path.display(),
        viewer_port = config.viewer_port,
        server_port = config.server_port,
        allowed_modes = config.allowed_modes.bits(),
        max_sessions = config.max_sessions,
        listed_ids = config.id_list.len(),
        "Configuration loaded"
    );

    Ok(config)
}
