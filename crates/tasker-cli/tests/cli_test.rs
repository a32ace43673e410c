// Smoke tests for the `tasker` binary surface (no device required).

use assert_cmd::Command;
use predicates::prelude::*;

fn tasker() -> Command {
    let mut cmd = Command::cargo_bin("tasker").expect("binary builds");
    // Isolate from any developer config / token in the environment.
    cmd.env_remove("TASKER_API_KEY");
    cmd.env_remove("XDG_CONFIG_HOME");
    cmd.env("HOME", std::env::temp_dir());
    cmd
}

#[test]
fn help_lists_subcommands() {
    tasker()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn missing_device_is_a_usage_error() {
    tasker()
        .arg("stats")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No device configured"));
}

#[test]
fn completions_generate_without_a_device() {
    tasker()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tasker"));
}

#[test]
fn run_task_rejects_malformed_variables() {
    tasker()
        .args(["--host", "127.0.0.1", "task", "run", "T", "--var", "no-equals"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}
