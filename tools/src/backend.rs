//! Subprocess-backed toolchain.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::preflight::check_build_prerequisites;
use crate::process::ChildGuard;
use crate::{BuildRequest, Toolchain, ToolchainError, ToolchainFut, TranspileRequest};

/// Receives the backend's output one line at a time, as it is produced.
pub trait OutputSink: Send + Sync {
    fn stdout(&self, line: &str);
    fn stderr(&self, line: &str);
}

/// Forwards backend output to this process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn stdout(&self, line: &str) {
        let _ = writeln!(io::stdout().lock(), "{line}");
    }

    fn stderr(&self, line: &str) {
        let _ = writeln!(io::stderr().lock(), "{line}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn stdout(&self, _line: &str) {}
    fn stderr(&self, _line: &str) {}
}

/// Runs `<program> [args..] <command> <project_dir> --out-dir <out_dir> [flags]`.
pub struct BackendToolchain {
    program: String,
    args: Vec<String>,
    check_prerequisites: bool,
    sink: Arc<dyn OutputSink>,
}

impl BackendToolchain {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            check_prerequisites: true,
            sink: Arc::new(TerminalSink),
        }
    }

    /// Arguments placed before the subcommand.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn check_prerequisites(mut self, enabled: bool) -> Self {
        self.check_prerequisites = enabled;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn transpile_args(request: &TranspileRequest) -> Vec<OsString> {
        let mut args = vec![
            request.project_dir.clone().into_os_string(),
            "--out-dir".into(),
            request.out_dir.clone().into_os_string(),
        ];
        if request.stdout {
            args.push("--stdout".into());
        }
        args
    }

    fn build_args(request: &BuildRequest) -> Vec<OsString> {
        let mut args = vec![
            request.project_dir.clone().into_os_string(),
            "--out-dir".into(),
            request.out_dir.clone().into_os_string(),
        ];
        if request.release {
            args.push("--release".into());
        }
        args
    }

    async fn run(&self, command: &'static str, args: Vec<OsString>) -> Result<(), ToolchainError> {
        let program = which::which(&self.program).map_err(|_| ToolchainError::ProgramNotFound {
            program: self.program.clone(),
        })?;
        let io_error = |source: io::Error| ToolchainError::Io {
            program: self.program.clone(),
            source,
        };

        let mut cmd = Command::new(&program);
        cmd.args(&self.args)
            .arg(command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        crate::process::set_new_session(&mut cmd);

        tracing::info!(program = %program.display(), command, ?args, "spawning backend");
        let child = cmd.spawn().map_err(|source| ToolchainError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);
        let child = guard
            .child_mut()
            .ok_or_else(|| io_error(io::Error::other("backend process already reaped")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(io::Error::other("failed to capture backend stdout")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(io::Error::other("failed to capture backend stderr")))?;
        self.forward_output(stdout, stderr).await;

        let status = child.wait().await.map_err(io_error)?;
        guard.disarm();
        tracing::info!(command, status = ?status.code(), "backend exited");
        self.check_status(command, status)
    }

    async fn forward_output(
        &self,
        stdout: tokio::process::ChildStdout,
        stderr: tokio::process::ChildStderr,
    ) {
        let mut stdout = BufReader::new(stdout).lines();
        let mut stderr = BufReader::new(stderr).lines();
        let (mut stdout_open, mut stderr_open) = (true, true);

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => self.sink.stdout(&line),
                    Ok(None) => stdout_open = false,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to read backend stdout");
                        stdout_open = false;
                    }
                },
                line = stderr.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => self.sink.stderr(&line),
                    Ok(None) => stderr_open = false,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to read backend stderr");
                        stderr_open = false;
                    }
                },
            }
        }
    }

    fn check_status(&self, command: &'static str, status: ExitStatus) -> Result<(), ToolchainError> {
        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(ToolchainError::Exited {
                program: self.program.clone(),
                command,
                status: code,
            }),
            None => Err(ToolchainError::Terminated {
                program: self.program.clone(),
                command,
            }),
        }
    }
}

impl Toolchain for BackendToolchain {
    fn transpile(&self, request: TranspileRequest) -> ToolchainFut<'_> {
        Box::pin(async move {
            self.run("transpile", Self::transpile_args(&request)).await
        })
    }

    fn build(&self, request: BuildRequest) -> ToolchainFut<'_> {
        Box::pin(async move {
            if self.check_prerequisites {
                check_build_prerequisites().await?;
            }
            self.run("build", Self::build_args(&request)).await
        })
    }
}
