//! Polling against real commands

use regex::Regex;
use std::time::Duration;

use clustertest_core::application::{
    decode, predicate, regex_count_matcher, regex_matcher, simple_matcher, wait_for_command,
    wait_for_result, wait_for_success, PollPolicy,
};
use clustertest_core::port::{CommandOutput, ExecuteOptions};
use clustertest_core::HarnessError;
use clustertest_infra_system::SubprocessExecutor;

fn fast(attempts: u32) -> PollPolicy {
    PollPolicy::new(attempts, Duration::from_millis(10))
}

/// A background job flips a file; polling sees the change
#[tokio::test]
async fn test_waits_for_file_content() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    std::fs::write(&state, "booting\n").unwrap();

    let writer = {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            std::fs::write(&state, "ready\n").unwrap();
        })
    };

    let executor = SubprocessExecutor::new();
    let out = wait_for_command(
        &executor,
        &format!("cat {}", state.display()),
        &ExecuteOptions::default(),
        &regex_matcher(Regex::new("(?m)^ready$").unwrap()),
        &fast(100),
    )
    .await
    .unwrap();

    assert_eq!(out, "ready\n");
    writer.await.unwrap();
}

#[tokio::test]
async fn test_counts_matches_exactly() {
    let executor = SubprocessExecutor::new();
    let out = wait_for_command(
        &executor,
        "printf 'node1 Ready\\nnode2 Ready\\nnode3 NotReady\\n'",
        &ExecuteOptions::default(),
        &regex_count_matcher(Regex::new(r" Ready").unwrap(), 2),
        &fast(1),
    )
    .await
    .unwrap();
    assert_eq!(out.lines().count(), 3);
}

/// A checked command failing aborts the poll instead of retrying
#[tokio::test]
async fn test_failing_probe_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("calls");
    let executor = SubprocessExecutor::new();

    let err = wait_for_command(
        &executor,
        &format!("echo x >> {}; exit 1", counter.display()),
        &ExecuteOptions::default(),
        &simple_matcher(String::new()),
        &fast(5),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, HarnessError::Execution(_)));
    let calls = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(calls.lines().count(), 1);
}

#[tokio::test]
async fn test_wait_for_success_retries_failures() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("n");
    let executor = SubprocessExecutor::new();

    // fails twice, then succeeds
    let command = format!(
        "echo x >> {p}; [ $(wc -l < {p}) -ge 3 ]",
        p = counter.display()
    );
    let out: CommandOutput = wait_for_success(&executor, &command, &fast(10))
        .await
        .unwrap();
    assert_eq!(out.code, 0);
    assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), 3);
}

#[tokio::test]
async fn test_timeout_reports_last_stdout() {
    let executor = SubprocessExecutor::new();
    let opts = ExecuteOptions::captured();

    let err = wait_for_result(
        || clustertest_core::port::CommandRunner::execute(&executor, "echo still-waiting", &opts),
        decode::stdout,
        &predicate("contains done", |s: &String| s.contains("done")),
        &fast(3),
    )
    .await
    .unwrap_err();

    match err {
        HarnessError::Timeout {
            attempts,
            matcher,
            last_output,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(matcher, "contains done");
            assert_eq!(last_output.as_deref(), Some("\"still-waiting\\n\""));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
