//! `transpile` and `build`: argument definitions and handlers.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use py2binmod_core::{EXIT_FAILURE, Flow, Handler, Outcome, WithStatus, exit_with_error};
use py2binmod_tools::{BuildRequest, Toolchain, ToolchainError, TranspileRequest};

use crate::paths::resolve_path;

const ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Clone, Default, Args)]
pub struct TranspileArgs {
    /// Project directory [default: current directory]
    pub project_dir: Option<PathBuf>,
    /// Output directory [default: <PROJECT_DIR>/artifacts]
    #[arg(short = 'o', long = "out-dir", value_name = "PATH")]
    pub out_dir: Option<PathBuf>,
    /// Also print the generated module to stdout
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Project directory [default: current directory]
    pub project_dir: Option<PathBuf>,
    /// Output directory [default: <PROJECT_DIR>/artifacts]
    #[arg(short = 'o', long = "out-dir", value_name = "PATH")]
    pub out_dir: Option<PathBuf>,
    /// Build in release mode
    #[arg(long)]
    pub release: bool,
}

impl TranspileArgs {
    #[must_use]
    pub fn into_request(self, cwd: &Path) -> TranspileRequest {
        let (project_dir, out_dir) = resolve_dirs(self.project_dir, self.out_dir, cwd);
        TranspileRequest {
            project_dir,
            out_dir,
            stdout: self.stdout,
        }
    }
}

impl BuildArgs {
    #[must_use]
    pub fn into_request(self, cwd: &Path) -> BuildRequest {
        let (project_dir, out_dir) = resolve_dirs(self.project_dir, self.out_dir, cwd);
        BuildRequest {
            project_dir,
            out_dir,
            release: self.release,
        }
    }
}

fn resolve_dirs(
    project_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    cwd: &Path,
) -> (PathBuf, PathBuf) {
    let project_dir = resolve_path(project_dir.as_deref().unwrap_or(cwd), cwd);
    let out_dir = match out_dir {
        Some(out_dir) => resolve_path(&out_dir, cwd),
        None => resolve_path(&project_dir.join(ARTIFACTS_DIR), cwd),
    };
    (project_dir, out_dir)
}

pub(crate) fn transpile_command() -> Command {
    TranspileArgs::augment_args(
        Command::new("transpile").about("Transpile a Python project into module source"),
    )
}

pub(crate) fn build_command() -> Command {
    BuildArgs::augment_args(
        Command::new("build").about("Transpile and compile a Python project into a WebAssembly module"),
    )
}

pub(crate) fn transpile_handler(toolchain: Arc<dyn Toolchain>, debug: bool) -> Handler<ArgMatches> {
    Handler::suspending(move |matches: ArgMatches| {
        let toolchain = Arc::clone(&toolchain);
        async move {
            let request = TranspileArgs::from_arg_matches(&matches)?.into_request(&current_dir()?);
            tracing::info!(
                project_dir = %request.project_dir.display(),
                out_dir = %request.out_dir.display(),
                stdout = request.stdout,
                "transpile"
            );
            settle(toolchain.transpile(request).await, debug)
        }
    })
}

pub(crate) fn build_handler(toolchain: Arc<dyn Toolchain>, debug: bool) -> Handler<ArgMatches> {
    Handler::suspending(move |matches: ArgMatches| {
        let toolchain = Arc::clone(&toolchain);
        async move {
            let request = BuildArgs::from_arg_matches(&matches)?.into_request(&current_dir()?);
            tracing::info!(
                project_dir = %request.project_dir.display(),
                out_dir = %request.out_dir.display(),
                release = request.release,
                "build"
            );
            settle(toolchain.build(request).await, debug)
        }
    })
}

fn current_dir() -> anyhow::Result<PathBuf> {
    env::current_dir().context("failed to read the current directory")
}

/// Missing prerequisites get a formatted error line; every other failure is
/// left to the interceptor, with the backend's exit status attached. In debug
/// mode a prerequisite failure is still raised after its line is printed.
fn settle(result: Result<(), ToolchainError>, debug: bool) -> Outcome {
    match result {
        Ok(()) => Ok(Flow::Continue(())),
        Err(err) if err.is_prerequisite() => {
            let flow = exit_with_error(&err.to_string(), err.kind(), EXIT_FAILURE);
            if debug { Err(err.into()) } else { Ok(flow) }
        }
        Err(err) => match err.status() {
            Some(status) => Err(err).with_status(status),
            None => Err(err.into()),
        },
    }
}
