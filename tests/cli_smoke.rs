use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn jarrones_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("jarrones"))
}

fn cmd_with_home() -> (tempfile::TempDir, Command) {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = jarrones_cmd();
    cmd.env("JARRONES_HOME", home.path());
    (home, cmd)
}

#[test]
fn help_lists_commands() {
    let (_home, mut cmd) = cmd_with_home();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("session"))
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn jars_lists_fixed_table() {
    let (_home, mut cmd) = cmd_with_home();
    cmd.arg("jars");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Gastos básicos"))
        .stdout(predicate::str::contains("55%"))
        .stdout(predicate::str::contains("Donar"))
        .stdout(predicate::str::contains("Iglesia / Comunidad"));
}

#[test]
fn first_run_creates_config_and_data_dirs() {
    let (home, mut cmd) = cmd_with_home();
    cmd.arg("jars");
    cmd.assert().success();
    assert!(home.path().join("config").join("config.json").exists());
    assert!(home.path().join("data").is_dir());
}

#[test]
fn commands_needing_a_session_explain_how_to_start_one() {
    let (_home, mut cmd) = cmd_with_home();
    cmd.arg("status");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No active session"));
}

#[test]
fn history_is_empty_before_first_save() {
    let (_home, mut cmd) = cmd_with_home();
    cmd.args(["history", "monthly"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(no history)"));
}
