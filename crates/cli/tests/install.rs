#![cfg(unix)]

use assert_cmd::prelude::*;
use nodestrap_testing_utils::{
    bin::{nodestrap_with_temp_cwd, path_with_stub_bin},
    stub::{parse_tool_runs, recording_script, write_stub_tool},
};
use std::{fs, path::PathBuf, process::Command};
use tempfile::TempDir;

/// A `nodestrap` command in a fresh workspace whose `PATH` resolves `bun`
/// and `npm` to recording stub scripts.
fn nodestrap_with_stub_tools() -> (Command, TempDir, PathBuf, PathBuf) {
    let (mut command, root, workspace) = nodestrap_with_temp_cwd();
    let bin_dir = root.path().join("bin");
    fs::create_dir(&bin_dir).expect("create stub bin directory");
    let log = bin_dir.join("invocations.log");
    write_stub_tool(&bin_dir, "bun", &recording_script("bun", &log, 0.01));
    write_stub_tool(&bin_dir, "npm", &recording_script("npm", &log, 0.01));
    command.env("PATH", path_with_stub_bin(&bin_dir));
    (command, root, workspace, log)
}

#[test]
fn missing_package_json_is_an_error() {
    let (mut command, _root, _workspace, _log) = nodestrap_with_stub_tools();
    let output = command.args(["install", "express"]).output().expect("run nodestrap");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("package.json"), "unexpected stderr: {stderr}");
}

#[test]
fn mixed_outcomes_end_with_a_warning_summary() {
    let (mut command, _root, workspace, log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    let output = command
        .args(["install", "ok-a", "fail-b", "ok-c", "--mode", "b"])
        .output()
        .expect("run nodestrap");

    // non-strict failures degrade to warnings, the exit status stays zero
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("⚠ Installation completed with warnings"), "stdout: {stdout}");
    assert!(stdout.contains("Failed: 1/3 packages"), "stdout: {stdout}");
    assert!(stdout.contains("✗ fail-b"), "stdout: {stdout}");

    // every package was attempted exactly once
    let runs = parse_tool_runs(&log);
    assert_eq!(runs.len(), 3);
}

#[test]
fn all_successes_end_with_a_celebration() {
    let (mut command, _root, workspace, _log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    let output =
        command.args(["install", "ok-a", "ok-b", "--mode", "b"]).output().expect("run nodestrap");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✨ All packages installed successfully!"), "stdout: {stdout}");
    assert!(stdout.contains("2/2 packages"), "stdout: {stdout}");
}

#[test]
fn strict_mode_exits_non_zero_and_names_the_failed_package() {
    let (mut command, _root, workspace, _log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    let output = command
        .args(["install", "fail-broken", "--mode", "b", "--strict"])
        .output()
        .expect("run nodestrap");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✗ Installation failed in strict mode"), "stdout: {stdout}");
    assert!(stdout.contains("fail-broken"), "stdout: {stdout}");
}

#[test]
fn failure_detail_lines_come_from_stderr_markers() {
    let (mut command, _root, workspace, _log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    let output =
        command.args(["install", "fail-gone", "--mode", "b"]).output().expect("run nodestrap");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("npm ERR! code E404"), "stdout: {stdout}");
}

#[test]
fn npm_only_package_is_delegated_to_npm_even_under_bun() {
    let (mut command, _root, workspace, log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    command.args(["install", "nquickdev", "ok-a", "--mode", "b"]).assert().success();

    let runs = parse_tool_runs(&log);
    assert_eq!(runs.len(), 2);
    for run in &runs {
        match run.package.as_str() {
            "nquickdev" => assert_eq!(run.tool, "npm", "nquickdev must go through npm"),
            "ok-a" => assert_eq!(run.tool, "bun"),
            other => panic!("unexpected package in log: {other}"),
        }
    }
}

#[test]
fn save_dev_flag_shows_up_in_the_failure_summary() {
    let (mut command, _root, workspace, _log) = nodestrap_with_stub_tools();
    fs::write(workspace.join("package.json"), "{}").expect("write package.json");

    let output = command
        .args(["install", "fail-types", "--save-dev", "--mode", "b"])
        .output()
        .expect("run nodestrap");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fail-types (dev)"), "stdout: {stdout}");
}
