//! The real binary: exit codes, stream contract, environment switches.

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use crate::common::TestEnv;

#[test]
fn version_prints_and_succeeds() {
    let env = TestEnv::new();
    let expected = format!("py2binmod version: {}", py2binmod::VERSION);

    env.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(expected.as_str()))
        .stderr("");
    env.cmd().arg("-v").assert().success().stdout(contains(expected.as_str()));
}

#[test]
fn version_is_eager() {
    let env = TestEnv::new();
    let expected = format!("py2binmod version: {}", py2binmod::VERSION);

    env.cmd()
        .args(["-v", "build", "--nope"])
        .assert()
        .success()
        .stdout(contains(expected.as_str()))
        .stderr("");
}

#[test]
fn no_command_is_a_usage_error() {
    let env = TestEnv::new();
    env.cmd().assert().code(2).stderr(contains("Usage"));
}

#[test]
fn help_lists_both_commands() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("transpile").and(contains("build")));
}

#[test]
fn missing_backend_is_reported_in_one_line() {
    let env = TestEnv::new();
    env.cmd_with_backend(std::path::Path::new("py2binmod-no-such-backend"))
        .arg("transpile")
        .assert()
        .code(1)
        .stderr(contains("ProgramNotFound: py2binmod-no-such-backend not found in PATH"));
}

#[test]
fn missing_backend_is_raised_in_dev_mode() {
    let env = TestEnv::new();
    env.cmd_with_backend(std::path::Path::new("py2binmod-no-such-backend"))
        .env("DEV_MODE", "true")
        .arg("transpile")
        .assert()
        .code(1)
        .stderr(
            contains("ProgramNotFound: py2binmod-no-such-backend not found in PATH")
                .and(contains("Error: ")),
        );
}

#[cfg(unix)]
mod with_backend {
    use predicates::prelude::PredicateBooleanExt;
    use predicates::str::contains;

    use crate::common::TestEnv;

    #[test]
    fn build_forwards_resolved_paths() {
        let env = TestEnv::new();
        let backend = env.write_backend("echo \"$@\"");
        let expected = format!(
            "build {0} --out-dir {0}/artifacts --release",
            env.project.display()
        );

        env.cmd_with_backend(&backend)
            .args(["build", "--release"])
            .assert()
            .success()
            .stdout(contains(expected.as_str()));
    }

    #[test]
    fn backend_status_is_the_exit_code() {
        let env = TestEnv::new();
        let backend = env.write_backend("echo working\nexit 4");

        env.cmd_with_backend(&backend)
            .arg("transpile")
            .assert()
            .code(4)
            .stdout(contains("working"))
            .stderr("");
    }

    #[test]
    fn dev_mode_surfaces_raw_failure() {
        let env = TestEnv::new();
        let backend = env.write_backend("exit 4");

        env.cmd_with_backend(&backend)
            .env("DEV_MODE", "true")
            .arg("transpile")
            .assert()
            .code(1)
            .stderr(contains("exited with status 4"));
    }

    #[test]
    fn dev_mode_needs_exact_true() {
        let env = TestEnv::new();
        let backend = env.write_backend("exit 4");

        env.cmd_with_backend(&backend)
            .env("DEV_MODE", "1")
            .arg("transpile")
            .assert()
            .code(4)
            .stderr(contains("exited with status").not());
    }

    #[test]
    fn runs_are_logged_to_the_config_dir() {
        let env = TestEnv::new();
        let backend = env.write_backend("exit 0");

        env.cmd_with_backend(&backend)
            .env("PY2BINMOD_RUNTIME", "multi_thread")
            .arg("transpile")
            .assert()
            .success();

        let log = env.log_contents();
        assert!(log.contains("dispatching"), "log was: {log}");
        assert!(log.contains("transpile"), "log was: {log}");
    }

    #[test]
    fn unknown_runtime_flavor_is_logged() {
        let env = TestEnv::new();
        let backend = env.write_backend("exit 0");

        env.cmd_with_backend(&backend)
            .env("PY2BINMOD_RUNTIME", "bogus")
            .arg("transpile")
            .assert()
            .success();

        let log = env.log_contents();
        assert!(log.contains("Unknown runtime flavor"), "log was: {log}");
    }
}
