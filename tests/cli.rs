mod util;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;

fn pga() -> Command {
    let mut cmd = Command::cargo_bin("pga").expect("pga binary");
    // Keep the environment from leaking config into the run
    cmd.env_remove("PG_ANALYZE_LOG");
    cmd
}

#[test]
fn analyze_writes_sorted_jsonl() {
    // Given a small library with one ignored vendor file
    let tmp = util::make_library();

    // When
    pga()
        .current_dir(tmp.path())
        .args(["analyze", ".", "-o", "out/records.jsonl", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 3 files"));

    // Then one record per problem file, in path order
    let text = std::fs::read_to_string(tmp.path().join("out/records.jsonl")).expect("read jsonl");
    let records: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(records.len(), 3);

    let files: Vec<&str> = records.iter().map(|r| r["file"].as_str().expect("file")).collect();
    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);
    assert!(files[0].ends_with("linear.pg"));
    assert!(files.iter().all(|f| !f.contains("node_modules")));

    assert_eq!(records[1]["types"][0], "multiple_choice");
    assert_eq!(records[2]["types"][0], "unknown_pgml_blank");
}

#[test]
fn analyze_quiet_prints_nothing() {
    let tmp = util::make_library();

    pga()
        .current_dir(tmp.path())
        .args(["analyze", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    tmp.child("pg_analyze.jsonl").assert(predicate::path::exists());
}

#[test]
fn config_file_sets_default_output() {
    let tmp = util::make_library();
    tmp.child("pg-analyze.toml")
        .write_str("output_dir = \"reports\"\n\n[analyze]\njsonl_file = \"lib.jsonl\"\n")
        .expect("write config");

    pga()
        .current_dir(tmp.path())
        .args(["analyze", "Algebra", "--quiet"])
        .assert()
        .success();

    tmp.child("reports/lib.jsonl")
        .assert(predicate::str::contains("linear.pg"));
}

#[test]
fn classify_prints_one_record() {
    let tmp = util::make_library();

    let assert = pga()
        .current_dir(tmp.path())
        .args(["classify", "Choice/radio.pg"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert_eq!(stdout.lines().count(), 1);
    let v: Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(v["schema_version"], 1);
    assert_eq!(v["widgets"][0]["kind"], "radio");
    assert_eq!(v["macros"]["loadMacros"][0], "parserRadioButtons.pl");
}

#[test]
fn classify_pretty_spans_lines() {
    let tmp = util::make_library();

    pga()
        .current_dir(tmp.path())
        .args(["classify", "Pgml/blank_only.pg", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"schema_version\": 1,"));
}

#[test]
fn classify_missing_file_fails() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    pga()
        .current_dir(tmp.path())
        .args(["classify", "nope.pg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.pg"));
}

#[test]
fn init_then_refuse_without_force() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    pga()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    tmp.child("pg-analyze.toml")
        .assert(predicate::str::contains("sample_limit = 5"));

    pga()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn completions_to_stdout() {
    pga()
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pga"));
}

#[test]
fn completions_without_target_fails() {
    pga()
        .args(["completions", "zsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out-dir"));
}
