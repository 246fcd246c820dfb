//! Build prerequisites: a cargo installation and the WASI compilation target.

use std::process::Stdio;

use tokio::process::Command;

use crate::ToolchainError;

/// Compilation target the build produces modules for.
pub const WASM_TARGET: &str = "wasm32-wasip1";

/// Fail with the first missing prerequisite.
pub async fn check_build_prerequisites() -> Result<(), ToolchainError> {
    if which::which("cargo").is_err() {
        return Err(ToolchainError::CargoMissing);
    }

    let rustup = which::which("rustup").map_err(|_| ToolchainError::ProgramNotFound {
        program: "rustup".to_string(),
    })?;
    let output = Command::new(&rustup)
        .args(["target", "list", "--installed"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| ToolchainError::Spawn {
            program: "rustup".to_string(),
            source,
        })?;

    let installed = String::from_utf8_lossy(&output.stdout);
    if !lists_target(&installed, WASM_TARGET) {
        return Err(ToolchainError::TargetMissing {
            target: WASM_TARGET,
        });
    }
    tracing::debug!(target = WASM_TARGET, "build prerequisites satisfied");
    Ok(())
}

/// Whether `rustup target list --installed` output contains `target`.
#[must_use]
pub fn lists_target(installed: &str, target: &str) -> bool {
    installed.lines().any(|line| line.trim() == target)
}
