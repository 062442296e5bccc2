//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a gdtkit command
pub fn gdtkit() -> Command {
    Command::new(cargo::cargo_bin!("gdtkit"))
}

/// Write a YAML input file into a temp directory and return its path
pub fn write_input(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
