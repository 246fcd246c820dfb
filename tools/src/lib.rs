//! Transpile and build operations behind the py2binmod CLI.
//!
//! The CLI only knows the [`Toolchain`] trait. [`BackendToolchain`] is the
//! production implementation: it runs the configured backend program once per
//! request and streams its output.

mod backend;
mod preflight;
pub mod process;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;

pub use backend::{BackendToolchain, NullSink, OutputSink, TerminalSink};
pub use preflight::{WASM_TARGET, check_build_prerequisites, lists_target};

/// Toolchain operation future type alias.
pub type ToolchainFut<'a> = Pin<Box<dyn Future<Output = Result<(), ToolchainError>> + Send + 'a>>;

/// Inputs for `transpile`. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileRequest {
    pub project_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Print the generated module to stdout as well.
    pub stdout: bool,
}

/// Inputs for `build`. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub project_dir: PathBuf,
    pub out_dir: PathBuf,
    pub release: bool,
}

pub trait Toolchain: Send + Sync {
    fn transpile(&self, request: TranspileRequest) -> ToolchainFut<'_>;

    fn build(&self, request: BuildRequest) -> ToolchainFut<'_>;
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("{program} not found in PATH")]
    ProgramNotFound { program: String },
    #[error("Cargo is not installed or not found in PATH")]
    CargoMissing,
    #[error("The target '{target}' is not installed; run: rustup target add {target}")]
    TargetMissing { target: &'static str },
    #[error("failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} {command} exited with status {status}")]
    Exited {
        program: String,
        command: &'static str,
        status: i32,
    },
    #[error("{program} {command} was terminated by a signal")]
    Terminated {
        program: String,
        command: &'static str,
    },
    #[error("I/O error while running {program}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ToolchainError {
    /// Exit status reported by the backend process, when it exited normally.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        match self {
            Self::Exited { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A missing program or target that the user has to install.
    #[must_use]
    pub const fn is_prerequisite(&self) -> bool {
        matches!(
            self,
            Self::ProgramNotFound { .. } | Self::CargoMissing | Self::TargetMissing { .. }
        )
    }

    /// Short name used as the prefix of user-facing error lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProgramNotFound { .. } => "ProgramNotFound",
            Self::CargoMissing => "CargoMissing",
            Self::TargetMissing { .. } => "TargetMissing",
            Self::Spawn { .. } => "SpawnError",
            Self::Exited { .. } => "BackendFailed",
            Self::Terminated { .. } => "BackendTerminated",
            Self::Io { .. } => "IoError",
        }
    }
}
