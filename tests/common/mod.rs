//! Shared test utilities and fixtures
//!
//! An in-process toolchain that records requests, and an isolated home/config
//! for running the real binary against a fake backend script.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use py2binmod_tools::{BuildRequest, Toolchain, ToolchainError, ToolchainFut, TranspileRequest};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Transpile(TranspileRequest),
    Build(BuildRequest),
}

/// Records every request and answers with a fixed result.
#[derive(Default)]
pub struct RecordingToolchain {
    calls: Mutex<Vec<Call>>,
    failure: Option<fn() -> ToolchainError>,
}

impl RecordingToolchain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(failure: fn() -> ToolchainError) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            failure: Some(failure),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: Call) -> Result<(), ToolchainError> {
        self.calls.lock().unwrap().push(call);
        match self.failure {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

impl Toolchain for RecordingToolchain {
    fn transpile(&self, request: TranspileRequest) -> ToolchainFut<'_> {
        Box::pin(async move { self.answer(Call::Transpile(request)) })
    }

    fn build(&self, request: BuildRequest) -> ToolchainFut<'_> {
        Box::pin(async move { self.answer(Call::Build(request)) })
    }
}

/// Isolated home, config file and project directory for binary tests.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub config_dir: PathBuf,
    pub project: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = fs::canonicalize(tmp.path()).expect("canonical temp dir");

        let home = root.join("home");
        let config_dir = root.join("config");
        let project = root.join("project");
        for dir in [&home, &config_dir, &project] {
            fs::create_dir_all(dir).expect("create fixture dir");
        }
        fs::write(
            config_dir.join("config.toml"),
            "[backend]\ncheck_prerequisites = false\n",
        )
        .expect("write config");

        Self {
            _tmp: tmp,
            home,
            config_dir,
            project,
        }
    }

    /// Write an executable `/bin/sh` script to use as the backend.
    #[cfg(unix)]
    pub fn write_backend(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.config_dir.join("fake-backend.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write backend");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod backend");
        path
    }

    /// The binary, run from the project directory with a clean environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("py2binmod");
        cmd.current_dir(&self.project)
            .env("HOME", &self.home)
            .env("PY2BINMOD_CONFIG", self.config_dir.join("config.toml"))
            .env_remove("DEV_MODE")
            .env_remove("PY2BINMOD_BACKEND")
            .env_remove("PY2BINMOD_RUNTIME")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn cmd_with_backend(&self, backend: &Path) -> Command {
        let mut cmd = self.cmd();
        cmd.env("PY2BINMOD_BACKEND", backend);
        cmd
    }

    pub fn log_contents(&self) -> String {
        fs::read_to_string(self.config_dir.join("logs").join("py2binmod.log")).unwrap_or_default()
    }
}
