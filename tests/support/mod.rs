//! Test support utilities for integration tests.
//!
//! Provides an isolated test environment, command helpers and a local
//! stand-in for the version source.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod responder;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use responder::{Received, Responder};

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `dir` is the deployment directory; `home` stands in for HOME so the
/// user's real config file is never read.
pub struct Test {
    pub dir: TempDir,
    pub home: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.path().join("docker-compose.yml")
    }

    pub fn secret_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("secrets").join(name)
    }

    pub fn descriptor(&self) -> String {
        std::fs::read_to_string(self.descriptor_path()).expect("failed to read descriptor")
    }

    pub fn secret(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.secret_path(name)).expect("failed to read secret")
    }

    /// Write a config file under the temp home and return its path.
    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.home.path().join("manage.toml");
        std::fs::write(&path, contents).expect("failed to write config");
        path
    }
}
