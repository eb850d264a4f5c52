//! Integration tests for the command-line front end (eval, serve, show)

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gridlock_cli_{}_{}_{:?}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
        std::thread::current().id(),
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

fn gridlock(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gridlock"));
    // Tests must not pick up a user's ~/.config/gridlock/config.toml.
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("GRIDLOCK_LOG");
    cmd
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let home = scratch_dir();
    let output = gridlock(&home)
        .args(args)
        .output()
        .expect("Failed to execute command");
    let _ = std::fs::remove_dir_all(&home);
    split(output)
}

fn split(output: Output) -> (String, String, i32) {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);
    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["eval", "1", "+", "2", "*", "3"]);
    assert_eq!(stdout.trim(), "7");
    assert_eq!(code, 0);
}

#[test]
fn test_single_quoted_formula() {
    let (stdout, _, code) = run_command(&["eval", "( 1 + 2 ) * 3"]);
    assert_eq!(stdout.trim(), "9");
    assert_eq!(code, 0);
}

#[test]
fn test_unary_operator() {
    let (stdout, _, code) = run_command(&["eval", "9 x^(1/2) 0"]);
    assert_eq!(stdout.trim(), "3");
    assert_eq!(code, 0);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["eval", "1 / 0"]);
    assert_eq!(stdout.trim(), "#DIV/0!");
    assert_eq!(code, 1);
}

#[test]
fn test_trailing_operator() {
    let (stdout, _, code) = run_command(&["eval", "1", "+"]);
    assert_eq!(stdout.trim(), "#ERR");
    assert_eq!(code, 1);
}

#[test]
fn test_reference_to_empty_cell() {
    let (stdout, _, code) = run_command(&["eval", "A1 + 1"]);
    assert_eq!(stdout.trim(), "#REF!");
    assert_eq!(code, 1);
}

#[test]
fn test_serve_round_trip() {
    let home = scratch_dir();
    let mut child = gridlock(&home)
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn serve");

    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        let requests = [
            r#"{"type":"create_document","document":"d"}"#,
            r#"{"type":"lock_cell","document":"d","cell":"A1","user":"alice"}"#,
            r#"{"type":"lock_cell","document":"d","cell":"A1","user":"bob"}"#,
            "garbage",
            r#"{"type":"update_cell","document":"d","cell":"A1","formula":["1","+","2"],"user":"alice"}"#,
            r#"{"type":"sheet_state","document":"d"}"#,
        ];
        for request in requests {
            writeln!(stdin, "{}", request).unwrap();
        }
    }
    drop(child.stdin.take());

    let (stdout, _, code) = split(child.wait_with_output().expect("serve did not exit"));
    let _ = std::fs::remove_dir_all(&home);
    assert_eq!(code, 0);

    let responses: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 6);
    assert_eq!(responses[1]["type"], "locked");
    assert_eq!(responses[2]["kind"], "cell_already_locked");
    assert_eq!(responses[2]["editing_by"], "alice");
    assert_eq!(responses[3]["kind"], "invalid_request");
    assert_eq!(responses[4]["version"], 1);
    assert_eq!(
        responses[5],
        serde_json::json!({"type": "sheet_state", "version": 1, "cells": {"A1": ["1", "+", "2"]}})
    );
}

#[test]
fn test_show_recomputes_snapshot() {
    let home = scratch_dir();
    let path = home.join("sheet.json");
    std::fs::write(&path, r#"{"A1": ["B1", "+", "1"], "B1": ["5"], "A2": ["C9"]}"#).unwrap();

    let output = gridlock(&home)
        .args(["--columns", "3", "--rows", "2", "show"])
        .arg(&path)
        .output()
        .expect("Failed to execute command");
    let (stdout, _, code) = split(output);
    let _ = std::fs::remove_dir_all(&home);

    assert_eq!(code, 0);
    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(rows, vec!["6\t5\t", "#REF!\t\t"]);
}

#[test]
fn test_show_missing_file() {
    let (stdout, stderr, code) = run_command(&["show", "/definitely/not/here.json"]);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Failed to read"));
    assert_eq!(code, 1);
}

#[test]
fn test_invalid_columns_flag() {
    let (_, stderr, code) = run_command(&["--columns", "30", "eval", "1"]);
    assert!(stderr.contains("columns"));
    assert_eq!(code, 1);
}

#[test]
fn test_oversized_rows_flag() {
    let (stdout, stderr, code) = run_command(&["--rows", "100000000", "eval", "1"]);
    assert!(stdout.is_empty());
    assert!(stderr.contains("rows"));
    assert_eq!(code, 1);
}
