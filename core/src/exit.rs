//! Version and exit helpers.
//!
//! These never "return normally" in the sense of letting a command carry on:
//! apart from `show_version(false)` they all produce [`Flow::Terminate`],
//! which the caller returns as its outcome.

use std::io::{self, IsTerminal, Write};

use crossterm::style::Stylize;

use crate::handler::Flow;
use crate::status::EXIT_SUCCESS;

/// Name and version printed by `--version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl VersionInfo {
    #[must_use]
    pub const fn new(name: &'static str, version: &'static str) -> Self {
        Self { name, version }
    }
}

/// Print the version line to stdout and terminate with 0 when `flag` is set.
pub fn show_version(flag: bool, info: &VersionInfo) -> Flow<()> {
    show_version_to(&mut io::stdout().lock(), flag, info)
}

pub fn show_version_to<W: Write>(out: &mut W, flag: bool, info: &VersionInfo) -> Flow<()> {
    if !flag {
        return Flow::Continue(());
    }
    if let Err(err) = writeln!(out, "{} version: {}", info.name, info.version) {
        tracing::warn!(error = %err, "failed to write version line");
    }
    exit_with_code(EXIT_SUCCESS)
}

#[must_use]
pub const fn exit_with_code<T>(code: i32) -> Flow<T> {
    Flow::Terminate(code)
}

/// Write `"<name>: <message>"` to stderr and terminate with `code`.
pub fn exit_with_error<T>(message: &str, name: &str, code: i32) -> Flow<T> {
    let stderr = io::stderr();
    let styled = stderr.is_terminal();
    exit_with_error_to(&mut stderr.lock(), message, name, code, styled)
}

pub fn exit_with_error_to<W: Write, T>(
    out: &mut W,
    message: &str,
    name: &str,
    code: i32,
    styled: bool,
) -> Flow<T> {
    let written = if styled {
        writeln!(out, "{}: {message}", name.red())
    } else {
        writeln!(out, "{name}: {message}")
    };
    if let Err(err) = written {
        tracing::warn!(error = %err, "failed to write error line");
    }
    tracing::info!(name, exit_code = code, "exiting with error");
    exit_with_code(code)
}
