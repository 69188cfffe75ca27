//! Integration tests for the semu CLI.

use semu_cli as _;
use semu_core as _;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

const DOUBLER: &str = r#"{
    "name": "Double",
    "instructions": [
        {
            "name": "JUMP_ZERO",
            "type": "synthetic",
            "variable": "x1",
            "label": "L1",
            "arguments": [{ "name": "JZLabel", "value": "EXIT" }]
        },
        { "name": "DECREASE", "type": "basic", "variable": "x1" },
        { "name": "INCREASE", "type": "basic", "variable": "y" },
        { "name": "INCREASE", "type": "basic", "variable": "y" },
        {
            "name": "GOTO_LABEL",
            "type": "synthetic",
            "arguments": [{ "name": "gotoLabel", "value": "L1" }]
        }
    ]
}"#;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("semu")
}

fn create_temp_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn run_prints_output_and_cycles() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "double.json", DOUBLER);

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "3"])
        .output()
        .expect("failed to run semu");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("y = 6"), "{stdout}");
    assert!(stdout.contains("inputs: x1=0"), "{stdout}");
    assert!(stdout.contains("cycles: 20"), "{stdout}");
}

#[test]
fn run_json_matches_every_level() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "double.json", DOUBLER);

    for level in ["0", "1", "2", "9"] {
        let output = Command::new(binary_path())
            .args(["run", source.to_str().unwrap(), "--level", level, "--json", "2"])
            .output()
            .expect("failed to run semu");

        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["output"], 4, "level {level}");
    }
}

#[test]
fn run_reports_remaining_credits() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "double.json", DOUBLER);

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--credits", "10", "3"])
        .output()
        .expect("failed to run semu");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("insufficient credits"), "{stderr}");
    assert!(stderr.contains("remaining credits: 0"), "{stderr}");
}

#[test]
fn show_lists_lowered_instructions_with_provenance() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "double.json", DOUBLER);

    let output = Command::new(binary_path())
        .args(["show", source.to_str().unwrap(), "--level", "1"])
        .output()
        .expect("failed to run semu");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("program Double (level 1 of 2)"), "{stdout}");
    assert!(stdout.contains("inputs: x1"), "{stdout}");
    assert!(stdout.contains(" <<< #0 (S) [L1   ]"), "{stdout}");
}

#[test]
fn debug_reads_commands_from_stdin() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "double.json", DOUBLER);

    let mut child = Command::new(binary_path())
        .args(["debug", source.to_str().unwrap(), "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run semu");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"break 2\nresume\nstep\nback\nstate\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 7, "{stdout}");
    assert!(lines[0].starts_with("state Stepping; pc #0"));
    assert_eq!(lines[1], "breakpoint set at #2");
    assert!(lines[2].starts_with("breakpoint #2 after 2 steps"));
    assert!(lines[3].starts_with("executed #2"));
    assert_eq!(lines[4], "back at #2");
    assert!(lines[5].contains("breakpoints #2"));
    assert!(lines[6].starts_with("stopped: run #1"));
}

#[test]
fn missing_file_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("absent.json");

    let output = Command::new(binary_path())
        .args(["run", missing.to_str().unwrap()])
        .output()
        .expect("failed to run semu");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "{stderr}");
}

#[test]
fn invalid_program_fails_to_compile() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "broken.json",
        r#"{ "name": "Broken", "instructions": [
            { "name": "GOTO_LABEL", "type": "synthetic",
              "arguments": [{ "name": "gotoLabel", "value": "L4" }] }
        ] }"#,
    );

    let output = Command::new(binary_path())
        .args(["show", source.to_str().unwrap()])
        .output()
        .expect("failed to run semu");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'L4'"), "{stderr}");
}

#[test]
fn help_prints_usage() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run semu");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Usage: semu"));
}
