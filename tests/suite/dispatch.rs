//! In-process dispatch through the real command tree with a recording toolchain.

use std::env;
use std::path::PathBuf;

use py2binmod::build_cli;
use py2binmod::paths::resolve_path;
use py2binmod_core::{InterceptPolicy, RuntimePolicy, status_of};
use py2binmod_tools::{BuildRequest, ToolchainError, TranspileRequest};

use crate::common::{Call, RecordingToolchain};

fn cwd() -> PathBuf {
    let cwd = env::current_dir().unwrap();
    resolve_path(&cwd, &cwd)
}

#[test]
fn transpile_without_arguments_uses_cwd() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );

    assert_eq!(cli.run(["py2binmod", "transpile"]).unwrap(), 0);
    assert_eq!(
        toolchain.calls(),
        vec![Call::Transpile(TranspileRequest {
            project_dir: cwd(),
            out_dir: cwd().join("artifacts"),
            stdout: false,
        })]
    );
}

#[test]
fn build_with_release_and_explicit_paths() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );

    let code = cli
        .run(["py2binmod", "build", "--release", "/tmp/proj", "-o", "/tmp/out"])
        .unwrap();
    assert_eq!(code, 0);

    let calls = toolchain.calls();
    let [Call::Build(request)] = calls.as_slice() else {
        panic!("expected one build call, got {calls:?}");
    };
    assert!(request.release);
    assert!(request.project_dir.is_absolute() && request.out_dir.is_absolute());
    #[cfg(target_os = "linux")]
    assert_eq!(
        *request,
        BuildRequest {
            project_dir: PathBuf::from("/tmp/proj"),
            out_dir: PathBuf::from("/tmp/out"),
            release: true,
        }
    );
}

#[test]
fn transpile_stdout_flag_and_relative_project() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::multi_thread(Some(2)),
    );

    assert_eq!(cli.run(["py2binmod", "transpile", "--stdout", "demo"]).unwrap(), 0);
    assert_eq!(
        toolchain.calls(),
        vec![Call::Transpile(TranspileRequest {
            project_dir: cwd().join("demo"),
            out_dir: cwd().join("demo").join("artifacts"),
            stdout: true,
        })]
    );
}

#[test]
fn version_flag_skips_commands() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );

    assert_eq!(cli.run(["py2binmod", "--version"]).unwrap(), 0);
    assert_eq!(cli.run(["py2binmod", "-v", "build"]).unwrap(), 0);
    assert!(toolchain.calls().is_empty());
}

#[test]
fn missing_command_is_a_usage_error() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );
    assert_eq!(cli.run(["py2binmod"]).unwrap(), 2);
    assert!(toolchain.calls().is_empty());
}

#[test]
fn backend_status_becomes_exit_code() {
    let toolchain = RecordingToolchain::failing(|| ToolchainError::Exited {
        program: "backend".into(),
        command: "build",
        status: 5,
    });
    let cli = build_cli(
        toolchain,
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );
    assert_eq!(cli.run(["py2binmod", "build"]).unwrap(), 5);
}

#[test]
fn debug_mode_surfaces_the_failure() {
    let toolchain = RecordingToolchain::failing(|| ToolchainError::Exited {
        program: "backend".into(),
        command: "transpile",
        status: 5,
    });
    let cli = build_cli(
        toolchain,
        InterceptPolicy::new(true),
        RuntimePolicy::current_thread(),
    );

    let err = cli.run(["py2binmod", "transpile"]).unwrap_err();
    assert_eq!(err.to_string(), "backend transpile exited with status 5");
    assert_eq!(status_of(&err), Some(5));
}

#[test]
fn missing_prerequisite_exits_with_one() {
    let toolchain = RecordingToolchain::failing(|| ToolchainError::CargoMissing);
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );
    assert_eq!(cli.run(["py2binmod", "build"]).unwrap(), 1);
    assert_eq!(toolchain.calls().len(), 1);
}

#[test]
fn missing_prerequisite_is_raised_in_debug_mode() {
    let toolchain = RecordingToolchain::failing(|| ToolchainError::CargoMissing);
    let cli = build_cli(
        toolchain,
        InterceptPolicy::new(true),
        RuntimePolicy::current_thread(),
    );

    let err = cli.run(["py2binmod", "build"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolchainError>(),
        Some(ToolchainError::CargoMissing)
    ));
}

#[test]
fn version_flag_ignores_what_follows_it() {
    let toolchain = RecordingToolchain::new();
    let cli = build_cli(
        toolchain.clone(),
        InterceptPolicy::new(false),
        RuntimePolicy::current_thread(),
    );

    assert_eq!(cli.run(["py2binmod", "-v", "build", "--nope"]).unwrap(), 0);
    assert_eq!(cli.run(["py2binmod", "--version", "nosuchcmd"]).unwrap(), 0);
    assert!(toolchain.calls().is_empty());
}
