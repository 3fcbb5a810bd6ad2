//! Shared utilities for integration tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A configuration file in its own temporary directory.
///
/// The directory is removed when this value is dropped.
pub struct ConfigFile {
    _dir: TempDir,
    pub path: PathBuf,
}

/// Write `contents` to a fresh `uvncrepeater.ini`.
pub fn write_config(contents: &str) -> ConfigFile {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("uvncrepeater.ini");
    fs::write(&path, contents).unwrap();
    ConfigFile { _dir: dir, path }
}

/// A `[general]` section with the two listener ports followed by `rest`.
pub fn with_ports(rest: &str) -> String {
    format!("[general]\nviewerPort = 5999\nserverPort = 5900\n{rest}")
}
