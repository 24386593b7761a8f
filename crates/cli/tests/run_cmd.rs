//! CLI tests for the `cmdtree run` subcommand.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn cmdtree() -> Command {
    Command::new(cargo::cargo_bin!("cmdtree"))
}

fn run_json(args: &[&str]) -> (bool, serde_json::Value) {
    run_json_as(None, args)
}

fn run_json_as(profile: Option<&str>, args: &[&str]) -> (bool, serde_json::Value) {
    let mut cmd = cmdtree();
    if let Some(profile) = profile {
        cmd.args(["--profile", profile]);
    }
    let output = cmd
        .args(["--output", "json", "run"])
        .args(args)
        .output()
        .expect("run command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json = serde_json::from_str(&stdout).expect("valid json");
    (output.status.success(), json)
}

#[test]
fn executes_and_reports_messages() {
    let (ok, json) = run_json(&["add", "1", "2"]);
    assert!(ok);
    let report = &json[0];
    assert_eq!(report["line"], "add 1 2");
    assert_eq!(report["outcome"], "executed");
    assert_eq!(report["messages"], serde_json::json!(["3"]));
    assert!(report.get("reason").is_none());
}

#[test]
fn alias_reaches_the_same_command() {
    let (ok, json) = run_json(&["say", "hello", "world"]);
    assert!(ok);
    assert_eq!(json[0]["messages"], serde_json::json!(["hello world"]));
}

#[test]
fn too_few_tokens_fail_with_lacking_arguments() {
    let (ok, json) = run_json(&["add", "1"]);
    assert!(!ok);
    let report = &json[0];
    assert_eq!(report["outcome"], "failed");
    assert_eq!(report["reason"], "LACKING_ARGUMENTS");
    let diag = &report["diagnostics"][0];
    assert_eq!(diag["id"], "CMD1001");
    assert_eq!(diag["context"]["min"], "2");
    assert_eq!(diag["context"]["actual"], "1");
}

#[test]
fn malformed_token_fails_with_insufficient_arguments() {
    let (ok, json) = run_json(&["add", "1", "two"]);
    assert!(!ok);
    assert_eq!(json[0]["reason"], "INSUFFICIENT_ARGUMENTS");
    assert_eq!(json[0]["diagnostics"][0]["id"], "CMD1003");
}

#[test]
fn too_many_tokens_fail_with_extra_arguments() {
    let (ok, json) = run_json(&["toggle", "true", "false"]);
    assert!(!ok);
    assert_eq!(json[0]["reason"], "EXTRA_ARGUMENTS");
    assert_eq!(json[0]["diagnostics"][0]["context"]["max"], "1");
}

#[test]
fn console_cannot_whisper() {
    let (ok, json) = run_json(&["msg", "bob", "hi"]);
    assert!(!ok);
    assert_eq!(json[0]["reason"], "INVALID_SENDER");
}

#[test]
fn unknown_command_is_unhandled() {
    let (ok, json) = run_json(&["frobnicate", "now"]);
    assert!(!ok);
    assert_eq!(json[0]["outcome"], "unhandled");
    assert!(json[0]["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn optional_tail_and_lookup_objects() {
    let (ok, json) = run_json(&["scale", "1.5"]);
    assert!(ok);
    assert_eq!(json[0]["messages"], serde_json::json!(["3"]));

    let (ok, json) = run_json(&["tp", "alice", "nether", "1", "64", "-2"]);
    assert!(ok, "{json}");
    assert_eq!(
        json[0]["messages"],
        serde_json::json!(["teleported alice to nether (1, 64, -2)"])
    );

    let (ok, json) = run_json(&["tp", "alice", "moon", "1", "64", "-2"]);
    assert!(!ok);
    assert_eq!(json[0]["reason"], "INSUFFICIENT_ARGUMENTS");
}

#[test]
fn profile_limits_permissions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("alice.json");
    fs::write(
        &path,
        r#"{ "name": "alice", "kind": "player", "permissions": ["demo.gamemode"] }"#,
    )
    .expect("write profile");
    let path = path.to_str().expect("utf-8 path");

    let (ok, json) = run_json_as(Some(path), &["add", "1", "2"]);
    assert!(!ok);
    assert_eq!(json[0]["reason"], "LACKING_PERMISSION");
    assert_eq!(json[0]["diagnostics"][0]["id"], "CMD1005");

    let (ok, json) = run_json_as(Some(path), &["gm", "creative"]);
    assert!(ok, "{json}");
    assert_eq!(
        json[0]["messages"],
        serde_json::json!(["set alice's game mode to creative"])
    );

    let (ok, json) = run_json_as(Some(path), &["msg", "bob", "hi", "there"]);
    assert!(ok, "{json}");
    assert_eq!(json[0]["messages"], serde_json::json!(["[alice -> bob] hi there"]));
}

#[test]
fn invalid_profile_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "name": "x", "permissions": ["demo..tp"] }"#).expect("write profile");

    let output = cmdtree()
        .args(["--profile", path.to_str().unwrap(), "run", "echo", "hi"])
        .output()
        .expect("run command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("permissions[0]"), "stderr: {stderr}");
}

#[test]
fn script_switches_the_mutable_parameter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.txt");
    fs::write(
        &path,
        "# value starts as a whole number\nvalue 5\n\nsetmode BOOL\nvalue true\nvalue 5\n",
    )
    .expect("write script");

    let output = cmdtree()
        .args(["--output", "json", "run", "--script"])
        .arg(&path)
        .output()
        .expect("run command");
    assert!(!output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json");
    let outcomes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(outcomes, ["executed", "executed", "executed", "failed"]);
    assert_eq!(json[0]["messages"], serde_json::json!(["5"]));
    assert_eq!(json[1]["messages"], serde_json::json!(["value now takes bool"]));
    assert_eq!(json[2]["messages"], serde_json::json!(["true"]));
    assert_eq!(json[3]["reason"], "INSUFFICIENT_ARGUMENTS");
}

#[test]
fn pretty_failure_renders_code_on_stderr() {
    let output = cmdtree()
        .args(["--output", "pretty", "run", "add", "1", "x"])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CMD1003"), "stderr: {stderr}");
}

#[test]
fn run_without_words_or_script_is_a_usage_error() {
    let output = cmdtree().arg("run").output().expect("run command");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<WORDS>"), "stderr: {stderr}");
    assert!(!stderr.contains("unknown command"), "stderr: {stderr}");
}
