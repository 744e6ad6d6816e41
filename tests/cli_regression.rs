// Exercises the gtest-oracle binary end to end.
mod common;

use std::fs;

use assert_cmd::Command;
use common::fixture;
use predicates::prelude::*;
use predicates::str::contains;

fn oracle() -> Command {
    let mut cmd = Command::cargo_bin("gtest-oracle").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("GTEST_ORACLE_MESSAGE_MATCH")
        .arg("--color")
        .arg("never");
    cmd
}

#[test]
fn agreement_exits_zero() {
    oracle()
        .arg("verify")
        .arg(fixture("cpp"))
        .arg(fixture("runs/agreeing.json"))
        .assert()
        .code(0)
        .stdout(contains("OK: all outcomes agree"))
        .stdout(contains("matched                14"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn mismatches_exit_one_and_stream_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let diagnostics = dir.path().join("diagnostics.jsonl");
    oracle()
        .arg("verify")
        .arg(fixture("cpp"))
        .arg(fixture("runs/disagreeing.json"))
        .arg("--diagnostics")
        .arg(&diagnostics)
        .assert()
        .code(1)
        .stdout(contains("status-mismatch TestThree::TestFailure"))
        .stdout(contains("missing-actual TestOneMore::TestMultipleNamespaces"))
        .stdout(contains("FAIL: 5 mismatch(es)"));

    let text = fs::read_to_string(&diagnostics).unwrap();
    let records: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["kind"], "status-mismatch");
    assert_eq!(records[4]["kind"], "unexpected-actual");
    assert_eq!(records[4]["name"], "Unexpected::Extra");
}

#[test]
fn diagnostics_default_to_stderr() {
    oracle()
        .arg("verify")
        .arg(fixture("cpp"))
        .arg(fixture("runs/disagreeing.json"))
        .assert()
        .code(1)
        .stderr(contains("\"kind\":\"missing-actual\""));
}

#[test]
fn malformed_annotations_exit_two() {
    oracle()
        .arg("verify")
        .arg(fixture("malformed"))
        .arg(fixture("runs/agreeing.json"))
        .assert()
        .code(2)
        .stdout(contains("malformed-annotation"))
        .stdout(contains("MALFORMED"));
}

#[test]
fn missing_run_output_exits_two_with_diagnostic() {
    oracle()
        .arg("verify")
        .arg(fixture("cpp"))
        .arg(fixture("runs/absent.json"))
        .assert()
        .code(2)
        .stderr(contains("gtest_oracle::io").and(contains("absent.json")));
}

#[test]
fn strict_matching_can_be_selected_from_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("t.cpp");
    fs::write(
        &source,
        "TEST(A, B) { // NODE:A::B,failed\n  x(); /* MESSAGE:\n  Value of: true\n  */\n} // NODEEND\n",
    )
    .unwrap();
    let run = dir.path().join("run.jsonl");
    fs::write(
        &run,
        "{\"name\":\"A::B\",\"status\":\"failed\",\"failures\":[\"Value of: true\\n  Actual: true\"]}\n",
    )
    .unwrap();

    oracle().arg("verify").arg(&source).arg(&run).assert().code(0);
    oracle()
        .env("GTEST_ORACLE_MESSAGE_MATCH", "strict")
        .arg("verify")
        .arg(&source)
        .arg(&run)
        .assert()
        .code(1)
        .stdout(contains("message-mismatch A::B"));
}

#[test]
fn extract_prints_expected_cases() {
    let output = oracle().arg("extract").arg(fixture("cpp")).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files"], 3);
    assert_eq!(value["cases"].as_array().unwrap().len(), 14);
    assert_eq!(value["cases"][0]["name"], "TestThree::TestFailure");
    assert_eq!(value["cases"][0]["status"], "failed");
}

#[test]
fn extract_exits_two_on_malformed_sources() {
    oracle()
        .arg("extract")
        .arg(fixture("malformed"))
        .assert()
        .code(2)
        .stdout(contains("malformed-annotation"));
}
