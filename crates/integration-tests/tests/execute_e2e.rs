//! End-to-end checks for the subprocess executor
//!
//! Exercises real `/bin/sh` children: pipe back-pressure, mixed logging and
//! capture settings, and exit-status reporting.

use clustertest_core::port::{CommandRunner, ExecuteOptions, ExecutionError};
use clustertest_harness::init_test_logging;
use clustertest_infra_system::SubprocessExecutor;
use std::collections::HashMap;
use tokio_test::{assert_err, assert_ok};

/// More than a pipe buffer on both streams must not deadlock
#[tokio::test]
async fn test_large_output_on_both_streams() {
    init_test_logging();
    let executor = SubprocessExecutor::new();

    // ~200KB on each stream, interleaved
    let command = "i=0; while [ $i -lt 20000 ]; do echo \"line-$i\"; echo \"err-$i\" >&2; i=$((i+1)); done";
    let out = assert_ok!(
        executor
            .run(command, &ExecuteOptions::captured().log_stdout(false).log_stderr(false))
            .await
    );

    let stdout = out.stdout.unwrap();
    let stderr = out.stderr.unwrap();
    assert_eq!(stdout.lines().count(), 20000);
    assert_eq!(stderr.lines().count(), 20000);
    assert_eq!(stdout.lines().last(), Some("line-19999"));
    assert_eq!(stderr.lines().next(), Some("err-0"));
}

/// One stream logged line by line, the other slurped, both captured
#[tokio::test]
async fn test_mixed_logging_and_capture() {
    let executor = SubprocessExecutor::new();
    let opts = ExecuteOptions::captured().log_stdout(true).log_stderr(false);

    let out = assert_ok!(executor.run("echo a; echo b >&2; echo c", &opts).await);
    assert_eq!(out.stdout.as_deref(), Some("a\nc\n"));
    assert_eq!(out.stderr.as_deref(), Some("b\n"));
}

/// Logged but uncaptured streams are still drained and yield `None`
#[tokio::test]
async fn test_logged_only() {
    let executor = SubprocessExecutor::new();
    let out = assert_ok!(
        executor
            .run("seq 1 1000; seq 1 1000 >&2", &ExecuteOptions::default())
            .await
    );
    assert_eq!(out.code, 0);
    assert!(out.stdout.is_none());
    assert!(out.stderr.is_none());
}

#[tokio::test]
async fn test_non_zero_exit_through_trait_object() {
    let runner: Box<dyn CommandRunner> = Box::new(SubprocessExecutor::new());

    let err = assert_err!(
        runner
            .execute("echo diag >&2; exit 7", &ExecuteOptions::captured())
            .await
    );
    match err {
        ExecutionError::NonZeroExit { code, stderr, .. } => {
            assert_eq!(code, 7);
            assert_eq!(stderr.as_deref(), Some("diag\n"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let out = assert_ok!(
        runner
            .execute("exit 7", &ExecuteOptions::default().check(false))
            .await
    );
    assert_eq!(out.code, 7);
}

#[tokio::test]
async fn test_env_and_working_dir_together() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "present\n").unwrap();

    let mut env = HashMap::new();
    env.insert("NAME".to_string(), "marker.txt".to_string());

    let executor = SubprocessExecutor::new();
    let out = assert_ok!(
        executor
            .run(
                "read line < \"$NAME\"; echo \"$line\"",
                &ExecuteOptions::captured().env(env).working_dir(dir.path()),
            )
            .await
    );
    assert_eq!(out.stdout.as_deref(), Some("present\n"));
}
