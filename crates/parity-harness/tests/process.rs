//! Real-process tests for the command runner and the full harness
//!
//! These spawn `sh`, so they only run on unix hosts.

#![cfg(unix)]

use parity_harness::parity_trace::{extract, Direction};
use parity_harness::{
    CommandRunner, ExecutionError, HarnessConfig, HarnessError, Invocation, ParityHarness,
    ProcessRunner,
};
use std::fs;
use std::path::PathBuf;
use std::os::unix::fs::PermissionsExt;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").args(["-c", script])
}

#[tokio::test]
async fn test_merges_stdout_and_stderr() {
    let result = ProcessRunner::new()
        .run(&sh("echo 'SENT_HEX: 01'; echo 'RECV_HEX: 02' 1>&2"))
        .await;

    assert!(result.is_success());
    let frames = extract(&result.combined_output);
    assert_eq!(frames.hexes(Direction::Sent), vec!["01"]);
    assert_eq!(frames.hexes(Direction::Recv), vec!["02"]);
}

#[tokio::test]
async fn test_nonzero_exit_keeps_output() {
    let result = ProcessRunner::new()
        .run(&sh("echo 'SENT_HEX: 0a'; exit 3"))
        .await;

    assert!(result.combined_output.contains("SENT_HEX: 0a"));
    assert!(matches!(
        result.error,
        Some(ExecutionError::ExitStatus { code: Some(3), .. })
    ));
}

#[tokio::test]
async fn test_unterminated_last_lines_stay_separate() {
    let result = ProcessRunner::new()
        .run(&sh("printf 'SENT_HEX: 01'; printf 'RECV_HEX: 02' 1>&2"))
        .await;

    let frames = extract(&result.combined_output);
    assert_eq!(frames.len(), 2);
}

#[tokio::test]
async fn test_relative_command_resolves_against_working_dir() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("emit.sh");
    fs::write(&script, "#!/bin/sh\ncat frames.log\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();
    fs::write(work.join("frames.log"), "RECV_HEX: abcff\n").unwrap();
    let inv = Invocation::new("../emit.sh").working_dir(&work);

    let result = ProcessRunner::new().run(&inv).await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(extract(&result.combined_output).hexes(Direction::Recv), vec!["ABCFF"]);
}

#[tokio::test]
async fn test_timeout_kills_child_and_keeps_partial_output() {
    let runner = ProcessRunner::new().with_timeout(Some(Duration::from_millis(500)));
    let start = Instant::now();

    let result = runner
        .run(&sh("echo 'SENT_HEX: 01'; exec sleep 30"))
        .await;

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(result.combined_output.contains("SENT_HEX: 01"));
    assert!(matches!(result.error, Some(ExecutionError::TimedOut { .. })));
}

#[tokio::test]
async fn test_timeout_keeps_every_line_written_before_deadline() {
    let runner = ProcessRunner::new().with_timeout(Some(Duration::from_millis(500)));

    let result = runner
        .run(&sh("for i in $(seq 1 200); do echo \"SENT_HEX: 0$i\"; done; exec sleep 30"))
        .await;

    assert!(matches!(result.error, Some(ExecutionError::TimedOut { .. })));
    assert_eq!(extract(&result.combined_output).count(Direction::Sent), 200);
}

/// True while `pid` names a live, non-zombie process
fn process_alive(pid: &str) -> bool {
    let output = std::process::Command::new("ps")
        .args(["-o", "stat=", "-p", pid])
        .output()
        .unwrap();
    let stat = String::from_utf8_lossy(&output.stdout);
    let stat = stat.trim();
    !stat.is_empty() && !stat.starts_with('Z')
}

#[tokio::test]
async fn test_dropping_run_future_kills_child() {
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("child.pid");
    let runner = ProcessRunner::new();
    let inv = sh(&format!("echo $$ > {}; exec sleep 30", pidfile.display()));
    let start = Instant::now();

    let outcome = tokio::time::timeout(Duration::from_secs(2), runner.run(&inv)).await;

    assert!(outcome.is_err());
    assert!(start.elapsed() < Duration::from_secs(10));

    let pid = fs::read_to_string(&pidfile).unwrap();
    let pid = pid.trim();
    assert!(!pid.is_empty());

    // The kill is sent on drop; give the exit a moment to be observed
    let deadline = Instant::now() + Duration::from_secs(5);
    while process_alive(pid) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!process_alive(pid), "child {} outlived the dropped run", pid);
}

#[tokio::test]
async fn test_config_loaded_through_relative_path_launches_candidate() {
    // Created under the current directory so it can be named relatively
    let dir = TempDir::new_in(".").unwrap();
    let rel_dir = PathBuf::from(dir.path().file_name().unwrap());

    let tests_dir = rel_dir.join("build").join("tests");
    fs::create_dir_all(&tests_dir).unwrap();
    let binary = tests_dir.join("dji_tests");
    fs::write(&binary, "#!/bin/sh\necho 'SENT_HEX: 7E01'\n").unwrap();
    fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

    let config_path = rel_dir.join("parity.yaml");
    fs::write(
        &config_path,
        "reference: {command: sh, args: [-c, \"echo 'SENT_HEX: 7e01'\"]}\n\
         candidates:\n  - {command: ./tests/dji_tests, working_dir: build}\n",
    )
    .unwrap();
    assert!(config_path.is_relative());

    let config = HarnessConfig::load(&config_path).unwrap();
    let result = ProcessRunner::new().run(&config.candidates[0]).await;
    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(extract(&result.combined_output).hexes(Direction::Sent), vec!["7E01"]);

    let report = ParityHarness::new(config).run().await.unwrap();
    assert_eq!(report.candidate_index, 0);
    assert!(report.passed());
}

#[tokio::test]
async fn test_harness_end_to_end() {
    let config = HarnessConfig {
        reference: sh("printf 'SENT_HEX: 7e01\\nnoise\\nRECV_HEX: 7e02\\n'"),
        candidates: vec![
            Invocation::new("./no-such-build/dji_tests"),
            sh("echo 'build finished'"),
            sh("echo 'SENT_HEX: 7E01'; echo 'RECV_HEX: 7E02' 1>&2; exit 1"),
            sh("echo 'SENT_HEX: FF'"),
        ],
        ..HarnessConfig::default()
    };

    let report = ParityHarness::new(config).run().await.unwrap();

    assert_eq!(report.candidate_index, 2);
    assert_eq!(report.counts(Direction::Sent), (1, 1));
    assert_eq!(report.counts(Direction::Recv), (1, 1));
    assert!(report.passed());
}

#[tokio::test]
async fn test_harness_reference_failure_skips_candidates() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("candidate-ran");
    let config = HarnessConfig {
        reference: Invocation::new("./missing-reference"),
        candidates: vec![sh(&format!("touch {}", marker.display()))],
        ..HarnessConfig::default()
    };

    let err = ParityHarness::new(config).run().await.unwrap_err();

    assert!(matches!(err, HarnessError::ExecutionFailure { .. }));
    assert!(!marker.exists());
}
