//! End-to-end tests for loading configuration files from disk.

use std::fs;

use repeater_config::config::schema::{
    DEFAULT_EVENT_LISTENER_HOST, DEFAULT_EVENT_LISTENER_PORT, DEFAULT_OWN_IP_ADDRESS,
    DEFAULT_RUN_AS_USER, MAX_ID_LIST_LEN, MAX_USER_LEN,
};
use repeater_config::config::{
    load_config, AllowedModes, ConfigError, InvariantViolation, LoggingLevel, ValidationError,
    ValidationReason,
};

mod common;

fn expect_validation(err: ConfigError) -> ValidationError {
    match err {
        ConfigError::Validation(e) => e,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_ports_only_uses_defaults() {
    let file = common::write_config(&common::with_ports(""));
    let config = load_config(&file.path).unwrap();

    assert_eq!(config.viewer_port, 5999);
    assert_eq!(config.server_port, 5900);
    assert_eq!(config.logging_level, LoggingLevel::QUIET);
    assert!(!config.use_event_interface);
    assert_eq!(config.max_sessions, 0);
    assert!(config.id_list.is_empty());
    assert!(!config.require_listed_id);
    assert_eq!(config.allowed_modes, AllowedModes::ALL);
    assert_eq!(config.own_ip_address, DEFAULT_OWN_IP_ADDRESS);
    assert_eq!(config.run_as_user, DEFAULT_RUN_AS_USER);
    assert_eq!(config.event_listener_host, DEFAULT_EVENT_LISTENER_HOST);
    assert_eq!(config.event_listener_port, DEFAULT_EVENT_LISTENER_PORT);
    assert!(!config.use_http_for_event_listener);
}

#[test]
fn test_every_field_from_file() {
    let file = common::write_config(
        "\
# UltraVNC repeater
[general]
viewerport = 5901
serverport = 5501
ownipaddress = repeater.example.net
maxsessions = 10
runasuser = uvncrep
allowedmodes = 1
logginglevel = 3

[mode2]
requirelistedid = 0
idlist = 1111,2222

[eventinterface]
useeventinterface = 1
eventlistenerhost = 127.0.0.1
eventlistenerport = 2003
usehttp = false
",
    );
    let config = load_config(&file.path).unwrap();

    assert_eq!(config.viewer_port, 5901);
    assert_eq!(config.server_port, 5501);
    assert_eq!(config.own_ip_address, "repeater.example.net");
    assert_eq!(config.max_sessions, 10);
    assert_eq!(config.run_as_user, "uvncrep");
    assert_eq!(config.allowed_modes, AllowedModes::DIRECT);
    assert_eq!(config.logging_level, LoggingLevel::TRACE);
    assert!(!config.require_listed_id);
    assert_eq!(config.id_list.as_slice(), &[1111, 2222]);
    assert!(config.use_event_interface);
    assert_eq!(config.event_listener_host, "127.0.0.1");
    assert_eq!(config.event_listener_port, 2003);
    assert!(!config.use_http_for_event_listener);
}

#[test]
fn test_loading_twice_is_idempotent() {
    let file = common::write_config(&common::with_ports(
        "maxSessions = 4\n[mode2]\nrequireListedId = true\nid = 100100\nid = 100200\n",
    ));
    let first = load_config(&file.path).unwrap();
    let second = load_config(&file.path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.ini");
    match load_config(&path) {
        Err(ConfigError::FileNotFound { path: reported }) => assert_eq!(reported, path),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn test_directory_is_unreadable() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = load_config(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::FileUnreadable { .. }), "{err:?}");
}

#[test]
fn test_non_utf8_is_unreadable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("latin1.ini");
    fs::write(&path, b"[general]\nrunAsUser = \xe9t\xe9\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::FileUnreadable { .. }), "{err:?}");
}

#[test]
fn test_non_numeric_integer_fields() {
    for key in [
        "viewerPort",
        "serverPort",
        "maxSessions",
        "loggingLevel",
        "allowedModes",
    ] {
        let file = common::write_config(&format!("[general]\n{key} = abc\n"));
        let err = expect_validation(load_config(&file.path).unwrap_err());
        assert_eq!(err.key, key);
        assert_eq!(err.reason, ValidationReason::NotAnInteger);
    }

    let file = common::write_config("[eventInterface]\neventListenerPort = twenty\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "eventListenerPort");
}

#[test]
fn test_max_sessions_not_an_integer() {
    let file = common::write_config(&common::with_ports("maxSessions = abc\n"));
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "maxSessions");
    assert_eq!(err.reason.to_string(), "not an integer");
}

#[test]
fn test_ports_out_of_range() {
    for value in ["0", "70000", "-5"] {
        let file = common::write_config(&format!("[general]\nviewerPort = {value}\n"));
        let err = expect_validation(load_config(&file.path).unwrap_err());
        assert_eq!(err.key, "viewerPort");
        assert!(matches!(err.reason, ValidationReason::OutOfRange { .. }), "{value}");
    }

    let file = common::write_config("[eventInterface]\neventListenerPort = 65536\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "eventListenerPort");
}

#[test]
fn test_required_id_list_must_not_be_empty() {
    let file = common::write_config(&common::with_ports("[mode2]\nrequireListedId = true\n"));
    let err = load_config(&file.path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CrossFieldInvariantViolation(InvariantViolation::EmptyRequiredIdList)
    ));
}

#[test]
fn test_duplicate_ids_rejected() {
    let file = common::write_config("[mode2]\nid = 100100\nid = 100100\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "idList");
    assert_eq!(err.reason, ValidationReason::DuplicateEntry);
    assert_eq!(err.reason.to_string(), "duplicate entry");
}

#[test]
fn test_id_list_capacity() {
    let ids: Vec<String> = (1..=MAX_ID_LIST_LEN as u32 + 1).map(|id| id.to_string()).collect();
    let file = common::write_config(&format!("[mode2]\nidList = {}\n", ids.join(", ")));
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "idList");
    assert_eq!(
        err.reason,
        ValidationReason::CapacityExceeded {
            max: MAX_ID_LIST_LEN
        }
    );

    let file = common::write_config(&format!(
        "[mode2]\nidList = {}\n",
        ids[..MAX_ID_LIST_LEN].join(" ")
    ));
    let config = load_config(&file.path).unwrap();
    assert_eq!(config.id_list.len(), MAX_ID_LIST_LEN);
}

#[test]
fn test_booleans() {
    let file = common::write_config("[eventInterface]\nuseEventInterface = YES\n");
    assert!(load_config(&file.path).unwrap().use_event_interface);

    let file = common::write_config("[eventInterface]\nuseEventInterface = maybe\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "useEventInterface");
    assert_eq!(err.reason, ValidationReason::NotABoolean);
}

#[test]
fn test_allowed_modes_strict() {
    for value in ["0", "4", "255"] {
        let file = common::write_config(&format!("[general]\nallowedModes = {value}\n"));
        let err = expect_validation(load_config(&file.path).unwrap_err());
        assert_eq!(err.reason, ValidationReason::UnknownModes, "{value}");
    }
}

#[test]
fn test_string_bounds() {
    let long_user = "u".repeat(MAX_USER_LEN + 1);
    let file = common::write_config(&format!("[general]\nrunAsUser = {long_user}\n"));
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "runAsUser");
    assert_eq!(err.reason, ValidationReason::TooLong { max: MAX_USER_LEN });

    let file = common::write_config("[general]\nrunAsUser = bad\u{1b}user\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.reason, ValidationReason::ControlCharacter);

    let file = common::write_config("[eventInterface]\neventListenerHost = not a host\n");
    let err = expect_validation(load_config(&file.path).unwrap_err());
    assert_eq!(err.key, "eventListenerHost");
    assert_eq!(err.reason, ValidationReason::InvalidHost);
}

#[test]
fn test_unknown_content_is_tolerated() {
    let file = common::write_config(
        "\
top level noise
[mode1]
allowedmode1serverport = 0
srvListAllow0 = 10.0.0.0
[general]
viewerPort = 5999
serverPort = 5900
someFutureSetting = on
",
    );
    let config = load_config(&file.path).unwrap();
    assert_eq!(config.viewer_port, 5999);
}

#[test]
fn test_malformed_line_in_known_section() {
    let file = common::write_config("[general]\nviewerPort = 5999\n\nserverPort 5900\n");
    match load_config(&file.path).unwrap_err() {
        ConfigError::MalformedLine { line, content } => {
            assert_eq!(line, 4);
            assert_eq!(content, "serverPort 5900");
        }
        other => panic!("expected MalformedLine, got {other:?}"),
    }
}

#[test]
fn test_listener_ports_must_differ() {
    let file = common::write_config("[general]\nviewerPort = 5500\n");
    let err = load_config(&file.path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CrossFieldInvariantViolation(InvariantViolation::PortClash {
            port: 5500,
            defaulted: Some("serverPort")
        })
    ));
    assert!(err.to_string().contains("serverPort was not set"), "{err}");

    let file = common::write_config(&common::with_ports("viewerPort = 5900\n"));
    let err = load_config(&file.path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "{err:?}");

    let file = common::write_config("[general]\nviewerPort = 6000\nserverPort = 6000\n");
    let err = load_config(&file.path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CrossFieldInvariantViolation(InvariantViolation::PortClash {
            port: 6000,
            defaulted: None
        })
    ));
}
