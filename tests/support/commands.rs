//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

const CLEARED_ENV: &[&str] = &[
    "OPENSLIDES_REF",
    "OPENSLIDES_HTTP_PORT",
    "OPENSLIDES_MANAGE_PORT",
    "OPENSLIDES_TIMEOUT",
    "OPENSLIDES_DATA_DIR",
    "OPENSLIDES_SOURCE_URL",
    "OPENSLIDES_CONFIG",
    "OPENSLIDES_LOG",
    "XDG_DATA_HOME",
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

impl Test {
    /// Create a command isolated from the caller's environment.
    ///
    /// HOME and XDG_CONFIG_HOME point at the temp home, colors are off.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("openslides").expect("failed to find openslides binary");
        for var in CLEARED_ENV {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path().join(".config"));
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// `openslides start` against `source_url` into the test directory.
    pub fn start(&self, source_url: &str, extra: &[&str]) -> Output {
        self.cmd()
            .arg("start")
            .arg("--data-dir")
            .arg(self.dir.path())
            .args(["--source-url", source_url])
            .args(extra)
            .output()
            .expect("failed to run openslides start")
    }

    /// `openslides status` for the test directory.
    pub fn status(&self, extra: &[&str]) -> Output {
        self.cmd()
            .arg("status")
            .arg("--data-dir")
            .arg(self.dir.path())
            .args(extra)
            .output()
            .expect("failed to run openslides status")
    }
}
